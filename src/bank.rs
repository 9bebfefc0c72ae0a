//! Question bank files.
//!
//! A bank is a JSON array of question records. Writes go through a temp file
//! in the target directory followed by a rename, so a reader never observes a
//! half-written bank and a failed run leaves the original file as it was.

use crate::distribution::AnswerDistribution;
use crate::question::QuestionRecord;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while reading or writing a bank
#[derive(Error, Debug)]
pub enum BankError {
    #[error("Question bank not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse question bank {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize question bank: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BankError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One loaded bank file
#[derive(Debug, Clone)]
pub struct BankSnapshot {
    path: PathBuf,
    raw: String,
    questions: Vec<QuestionRecord>,
}

impl BankSnapshot {
    /// Load a bank from disk
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is missing, `Io` if it cannot be read,
    /// and `Parse` if it is not a JSON array of records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BankError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BankError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| BankError::io(path, e))?;
        let questions = serde_json::from_str(&raw).map_err(|source| BankError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            raw,
            questions,
        })
    }

    /// Path the bank was loaded from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File content exactly as read
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Records in file order
    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Correct-answer distribution of this bank
    #[must_use]
    pub fn distribution(&self) -> AnswerDistribution {
        AnswerDistribution::from_questions(&self.questions)
    }

    /// Write `transformed` over this bank, keeping a backup of the original
    ///
    /// The transformed bank is serialized first; then the original content is
    /// written to the backup path; then the transformed content replaces the
    /// bank file. Each write is a temp-file rename, so a failure at any step
    /// leaves the bank file untouched.
    ///
    /// An existing backup is never overwritten: it holds the content from
    /// before the first run, and later runs only replace the bank file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or either write fails.
    pub fn persist_with_backup(
        &self,
        transformed: &[QuestionRecord],
    ) -> Result<PersistOutcome, BankError> {
        let content = to_json(transformed)?;
        let backup = backup_path(&self.path);

        let backup_created = !backup.is_file();
        if backup_created {
            write_atomic(&backup, &self.raw)?;
        } else {
            tracing::warn!(
                bank = %self.path.display(),
                backup = %backup.display(),
                "Backup already exists; keeping it and overwriting only the bank"
            );
        }
        write_atomic(&self.path, &content)?;

        tracing::info!(
            bank = %self.path.display(),
            backup = %backup.display(),
            backup_created = backup_created,
            questions = transformed.len(),
            "Persisted shuffled bank"
        );

        Ok(PersistOutcome {
            bank_path: self.path.clone(),
            backup_path: backup,
            backup_created,
        })
    }
}

/// Where a balance run wrote its files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    /// Overwritten bank
    pub bank_path: PathBuf,
    /// Copy of the pre-transform content
    pub backup_path: PathBuf,
    /// False when a backup from an earlier run was kept
    pub backup_created: bool,
}

/// Backup location for a bank: `people.json` -> `people.backup.json`
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("backup.json")
}

/// Whether `path` names a backup file
#[must_use]
pub fn is_backup_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".backup.json"))
}

/// Serialize records as a pretty-printed JSON array
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn to_json(questions: &[QuestionRecord]) -> Result<String, BankError> {
    let mut content = serde_json::to_string_pretty(questions)?;
    content.push('\n');
    Ok(content)
}

/// Replace `path` with `content` via a temp file and rename
///
/// # Errors
///
/// Returns `BankError::Io` if the temp file cannot be written or renamed.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), BankError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| BankError::io(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| BankError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| BankError::io(path, e))?;
    tmp.persist(path).map_err(|e| BankError::io(path, e.error))?;
    Ok(())
}
