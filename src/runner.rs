//! Batch execution across question banks.
//!
//! [`BalanceRunner`] shuffles every configured bank, spot-checks the result
//! in memory and (in apply mode) persists it with a backup. [`VerifyRunner`]
//! re-checks persisted banks against their backups. A bank that cannot be
//! loaded is reported and skipped; the rest of the run proceeds.

use crate::bank::{BankError, BankSnapshot, PersistOutcome};
use crate::config::{BalanceConfig, BankEntry};
use crate::distribution::AnswerDistribution;
use crate::question::QuestionRecord;
use crate::transform::QuestionTransformer;
use crate::verify::{verify_question, BankVerification, SpotCheckConfig, SpotChecker, VerificationResult, VerifyError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop a single bank from being processed
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("Question index {index} out of range (bank has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Whether a balance run writes to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Report only
    DryRun,
    /// Write backups and shuffled banks
    Apply,
}

/// Outcome for one balanced bank
#[derive(Debug, Clone, Serialize)]
pub struct BankRunResult {
    pub name: String,
    pub path: PathBuf,
    /// Seed the bank was shuffled with
    pub seed: u64,
    pub questions: usize,
    /// Records whose choice order changed
    pub shuffled: usize,
    /// Records passed through because they cannot be shuffled
    pub malformed: usize,
    pub before: AnswerDistribution,
    pub after: AnswerDistribution,
    /// In-memory spot check of the shuffled bank
    pub verification: BankVerification,
    /// Written files, in apply mode
    pub persisted: Option<PersistOutcome>,
}

/// A bank left out of a run
#[derive(Debug, Clone, Serialize)]
pub struct SkippedBank {
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedBank {
    fn new(entry: &BankEntry, reason: &RunnerError) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Everything a balance run did
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSummary {
    pub seed: u64,
    pub mode: RunMode,
    pub banks: Vec<BankRunResult>,
    pub skipped: Vec<SkippedBank>,
}

impl BalanceSummary {
    /// Combined distribution before shuffling
    #[must_use]
    pub fn before(&self) -> AnswerDistribution {
        let mut combined = AnswerDistribution::new();
        for bank in &self.banks {
            combined.merge(&bank.before);
        }
        combined
    }

    /// Combined distribution after shuffling
    #[must_use]
    pub fn after(&self) -> AnswerDistribution {
        let mut combined = AnswerDistribution::new();
        for bank in &self.banks {
            combined.merge(&bank.after);
        }
        combined
    }

    /// Questions across all processed banks
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.banks.iter().map(|b| b.questions).sum()
    }

    /// Every spot check passed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.banks.iter().all(|b| b.verification.is_clean())
    }
}

/// Shuffle driver for a list of banks
#[derive(Debug, Clone)]
pub struct BalanceRunner {
    seed: u64,
    mode: RunMode,
    checker: SpotChecker,
}

impl BalanceRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(seed: u64, mode: RunMode, verification: SpotCheckConfig) -> Self {
        Self {
            seed,
            mode,
            checker: SpotChecker::new(verification),
        }
    }

    /// Create a runner from a loaded configuration
    #[must_use]
    pub fn from_config(config: &BalanceConfig, mode: RunMode) -> Self {
        Self::new(config.seed, mode, config.verification.clone())
    }

    /// Run mode in use
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// Seed used for the bank at `ordinal`
    #[must_use]
    pub const fn bank_seed(&self, ordinal: usize) -> u64 {
        self.seed.wrapping_add(ordinal as u64)
    }

    /// Balance one bank
    ///
    /// # Errors
    ///
    /// Returns an error if the bank cannot be loaded, fails to verify
    /// structurally, or cannot be persisted.
    pub fn run_bank(&self, ordinal: usize, entry: &BankEntry) -> Result<BankRunResult, RunnerError> {
        let snapshot = BankSnapshot::load(&entry.path)?;
        let seed = self.bank_seed(ordinal);
        let transformer = QuestionTransformer::new(seed);

        tracing::info!(bank = %entry.path.display(), questions = snapshot.len(), seed = seed, "Balancing bank");

        let mut shuffled = 0;
        let mut malformed = 0;
        let mut transformed = Vec::with_capacity(snapshot.len());
        for (position, question) in snapshot.questions().iter().enumerate() {
            if !question.is_shufflable() {
                tracing::debug!(position = position, question = %question.identifier(), "Passing through malformed record");
                malformed += 1;
            }
            let result = transformer.transform(position, question);
            if !result.is_passthrough() {
                shuffled += 1;
            }
            transformed.push(result.question);
        }

        let verification = self.checker.verify_bank(snapshot.questions(), &transformed)?;

        let persisted = match self.mode {
            RunMode::Apply if verification.is_clean() => Some(snapshot.persist_with_backup(&transformed)?),
            RunMode::Apply => {
                tracing::error!(bank = %entry.path.display(), failed = verification.failed, "Spot check failed; bank left unchanged");
                None
            }
            RunMode::DryRun => None,
        };

        Ok(BankRunResult {
            name: entry.name.clone(),
            path: entry.path.clone(),
            seed,
            questions: snapshot.len(),
            shuffled,
            malformed,
            before: snapshot.distribution(),
            after: AnswerDistribution::from_questions(&transformed),
            verification,
            persisted,
        })
    }

    /// Balance every bank in order, skipping those that fail
    #[must_use]
    pub fn run(&self, banks: &[BankEntry]) -> BalanceSummary {
        let mut summary = BalanceSummary {
            seed: self.seed,
            mode: self.mode,
            banks: Vec::new(),
            skipped: Vec::new(),
        };

        for (ordinal, entry) in banks.iter().enumerate() {
            match self.run_bank(ordinal, entry) {
                Ok(result) => summary.banks.push(result),
                Err(e) => {
                    tracing::warn!(bank = %entry.path.display(), error = %e, "Skipping bank");
                    summary.skipped.push(SkippedBank::new(entry, &e));
                }
            }
        }

        tracing::info!(
            banks = summary.banks.len(),
            skipped = summary.skipped.len(),
            questions = summary.total_questions(),
            "Balance run finished"
        );
        summary
    }
}

/// Spot-check outcome for one persisted bank
#[derive(Debug, Clone, Serialize)]
pub struct BankVerifyResult {
    pub name: String,
    pub path: PathBuf,
    pub backup_path: PathBuf,
    pub verification: BankVerification,
}

/// Everything a verify run found
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub banks: Vec<BankVerifyResult>,
    pub skipped: Vec<SkippedBank>,
}

impl VerificationSummary {
    /// Questions checked across banks
    #[must_use]
    pub fn sampled(&self) -> usize {
        self.banks.iter().map(|b| b.verification.sample_size).sum()
    }

    /// Checked questions that passed
    #[must_use]
    pub fn passed(&self) -> usize {
        self.banks.iter().map(|b| b.verification.passed).sum()
    }

    /// Checked questions that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.banks.iter().map(|b| b.verification.failed).sum()
    }

    /// Checked questions with warnings
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.banks.iter().map(|b| b.verification.warnings).sum()
    }

    /// No sampled question failed in any bank
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Backup-versus-current verifier
#[derive(Debug, Clone, Default)]
pub struct VerifyRunner {
    checker: SpotChecker,
}

impl VerifyRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: SpotCheckConfig) -> Self {
        Self {
            checker: SpotChecker::new(config),
        }
    }

    /// Spot-check one bank against its backup
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be loaded or the pair is
    /// structurally mismatched.
    pub fn verify_bank(&self, entry: &BankEntry) -> Result<BankVerifyResult, RunnerError> {
        let backup_path = entry.backup_path();
        let original = BankSnapshot::load(&backup_path)?;
        let current = BankSnapshot::load(&entry.path)?;

        tracing::info!(bank = %entry.path.display(), questions = current.len(), "Verifying bank");
        let verification = self.checker.verify_bank(original.questions(), current.questions())?;

        Ok(BankVerifyResult {
            name: entry.name.clone(),
            path: entry.path.clone(),
            backup_path,
            verification,
        })
    }

    /// Verify every bank, skipping those that cannot be checked
    #[must_use]
    pub fn run(&self, banks: &[BankEntry]) -> VerificationSummary {
        let mut summary = VerificationSummary {
            banks: Vec::new(),
            skipped: Vec::new(),
        };
        for entry in banks {
            match self.verify_bank(entry) {
                Ok(result) => summary.banks.push(result),
                Err(e) => {
                    tracing::warn!(bank = %entry.path.display(), error = %e, "Skipping bank");
                    summary.skipped.push(SkippedBank::new(entry, &e));
                }
            }
        }
        summary
    }
}

/// Distribution of one bank, read-only
#[derive(Debug, Clone, Serialize)]
pub struct BankAnalysis {
    pub name: String,
    pub path: PathBuf,
    pub distribution: AnswerDistribution,
}

/// Distributions of every readable bank
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub banks: Vec<BankAnalysis>,
    pub skipped: Vec<SkippedBank>,
}

impl AnalysisSummary {
    /// Combined distribution across banks
    #[must_use]
    pub fn combined(&self) -> AnswerDistribution {
        let mut combined = AnswerDistribution::new();
        for bank in &self.banks {
            combined.merge(&bank.distribution);
        }
        combined
    }
}

/// Count correct-answer positions in every bank without modifying anything
#[must_use]
pub fn analyze_banks(banks: &[BankEntry]) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        banks: Vec::new(),
        skipped: Vec::new(),
    };
    for entry in banks {
        match BankSnapshot::load(&entry.path) {
            Ok(snapshot) => summary.banks.push(BankAnalysis {
                name: entry.name.clone(),
                path: entry.path.clone(),
                distribution: snapshot.distribution(),
            }),
            Err(e) => {
                tracing::warn!(bank = %entry.path.display(), error = %e, "Skipping bank");
                summary.skipped.push(SkippedBank::new(entry, &RunnerError::from(e)));
            }
        }
    }
    summary
}

/// One question from a backup next to its current form
#[derive(Debug, Clone, Serialize)]
pub struct QuestionComparison {
    pub bank: PathBuf,
    pub index: usize,
    pub original: QuestionRecord,
    pub transformed: QuestionRecord,
    pub result: VerificationResult,
}

/// Load question `index` from `bank` and its backup, and verify the pair
///
/// # Errors
///
/// Returns an error if either file cannot be loaded or `index` is out of
/// range in either of them.
pub fn compare_question(bank: &Path, index: usize) -> Result<QuestionComparison, RunnerError> {
    let entry = BankEntry::from_path(bank);
    let original = BankSnapshot::load(entry.backup_path())?;
    let current = BankSnapshot::load(&entry.path)?;

    let len = original.len().min(current.len());
    let (Some(orig), Some(upd)) = (original.questions().get(index), current.questions().get(index)) else {
        return Err(RunnerError::IndexOutOfRange { index, len });
    };

    Ok(QuestionComparison {
        bank: entry.path,
        index,
        original: orig.clone(),
        transformed: upd.clone(),
        result: verify_question(index, orig, upd),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{backup_path, to_json};
    use tempfile::TempDir;

    fn skewed_bank(n: usize) -> Vec<QuestionRecord> {
        (0..n)
            .map(|i| {
                QuestionRecord::new(
                    format!("q-{i}"),
                    format!("Question {i}?"),
                    vec![
                        format!("right {i}"),
                        format!("wrong {i}.1"),
                        format!("wrong {i}.2"),
                        format!("wrong {i}.3"),
                    ],
                    0,
                    "A: right. B: wrong (see C) and Option D is weak.",
                )
            })
            .collect()
    }

    fn write_bank(dir: &TempDir, name: &str, questions: &[QuestionRecord]) -> BankEntry {
        let path = dir.path().join(format!("{name}.json"));
        std::fs::write(&path, to_json(questions).expect("serialize")).expect("write bank");
        BankEntry::new(name, path)
    }

    fn full_check() -> SpotCheckConfig {
        SpotCheckConfig {
            sample_fraction: 1.0,
            ..SpotCheckConfig::default()
        }
    }

    // ========================================================================
    // BalanceRunner
    // ========================================================================

    #[test]
    fn test_dry_run_leaves_files_alone() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "people", &skewed_bank(40));
        let before = std::fs::read_to_string(&entry.path).expect("read");

        let runner = BalanceRunner::new(42, RunMode::DryRun, full_check());
        let summary = runner.run(std::slice::from_ref(&entry));

        assert_eq!(summary.banks.len(), 1);
        let result = &summary.banks[0];
        assert_eq!(result.before.counts(), &[40, 0, 0, 0]);
        assert_eq!(result.after.total(), 40);
        assert!(result.after.count(0) < 40);
        assert!(result.verification.is_clean());
        assert_eq!(result.verification.sample_size, 40);
        assert!(result.persisted.is_none());
        assert_eq!(std::fs::read_to_string(&entry.path).expect("read"), before);
        assert!(!backup_path(&entry.path).exists());
    }

    #[test]
    fn test_apply_writes_backup_and_bank() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "process", &skewed_bank(20));
        let raw = std::fs::read_to_string(&entry.path).expect("read");

        let runner = BalanceRunner::new(7, RunMode::Apply, full_check());
        let result = runner.run_bank(0, &entry).expect("balance");

        let outcome = result.persisted.expect("persisted");
        assert_eq!(std::fs::read_to_string(&outcome.backup_path).expect("backup"), raw);
        let current = BankSnapshot::load(&entry.path).expect("reload");
        assert_eq!(current.distribution(), result.after);
    }

    #[test]
    fn test_malformed_records_counted_and_passed_through() {
        let dir = TempDir::new().expect("temp dir");
        let mut bank = skewed_bank(3);
        bank[1].set_correct_answer_index(9);
        bank[2].set_choices(["only"]);
        let entry = write_bank(&dir, "odd", &bank);

        let runner = BalanceRunner::new(1, RunMode::DryRun, full_check());
        let result = runner.run_bank(0, &entry).expect("balance");
        assert_eq!(result.malformed, 2);
        assert!(result.shuffled <= 1);
        // A lone choice still has a valid correct index.
        assert_eq!(result.before.skipped(), 1);
    }

    #[test]
    fn test_wrongly_typed_records_pass_through_verbatim() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("mixed.json");
        let raw = r#"[
  {"domainId": "ok", "questionText": "Q?", "choices": ["a", "b", "c", "d"], "correctAnswerIndex": 0, "explanation": "A: yes."},
  {"domainId": "str", "questionText": "Q?", "choices": ["a", "b", "c", "d"], "correctAnswerIndex": "1", "explanation": "B: yes."},
  {"domainId": "float", "questionText": "Q?", "choices": ["a", "b", "c", "d"], "correctAnswerIndex": 1.0},
  {"domainId": "map", "questionText": "Q?", "choices": [{"text": "a"}, "b"], "correctAnswerIndex": 0}
]"#;
        std::fs::write(&path, raw).expect("write bank");
        let entry = BankEntry::new("mixed", &path);

        let result = BalanceRunner::new(3, RunMode::Apply, full_check())
            .run_bank(0, &entry)
            .expect("balance");
        assert_eq!(result.questions, 4);
        assert_eq!(result.malformed, 3);
        assert!(result.verification.is_clean());
        assert!(result.persisted.is_some());

        let before: Vec<serde_json::Value> = serde_json::from_str(raw).expect("parse original");
        let after: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse bank");
        assert_eq!(after[1..], before[1..]);

        let good: QuestionRecord = serde_json::from_value(before[0].clone()).expect("record");
        let expected = QuestionTransformer::new(3).transform(0, &good);
        assert_eq!(after[0], serde_json::to_value(&expected.question).expect("value"));
        assert_eq!(result.shuffled, usize::from(!expected.is_passthrough()));
    }

    #[test]
    fn test_missing_bank_is_skipped() {
        let dir = TempDir::new().expect("temp dir");
        let good = write_bank(&dir, "good", &skewed_bank(4));
        let missing = BankEntry::new("gone", dir.path().join("gone.json"));

        let runner = BalanceRunner::new(42, RunMode::DryRun, full_check());
        let summary = runner.run(&[missing, good]);
        assert_eq!(summary.banks.len(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "gone");
        assert!(summary.skipped[0].reason.contains("gone.json"));
    }

    #[test]
    fn test_bank_seeds_follow_ordinal() {
        let runner = BalanceRunner::new(100, RunMode::DryRun, SpotCheckConfig::default());
        assert_eq!(runner.bank_seed(0), 100);
        assert_eq!(runner.bank_seed(3), 103);
        assert_eq!(BalanceRunner::new(u64::MAX, RunMode::DryRun, SpotCheckConfig::default()).bank_seed(1), 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "a", &skewed_bank(30));
        let runner = BalanceRunner::new(5, RunMode::DryRun, full_check());
        let first = runner.run_bank(0, &entry).expect("first");
        let second = runner.run_bank(0, &entry).expect("second");
        assert_eq!(first.after, second.after);
        let other = runner.run_bank(1, &entry).expect("other ordinal");
        assert_eq!(other.seed, 6);
    }

    #[test]
    fn test_summary_combines_banks() {
        let dir = TempDir::new().expect("temp dir");
        let a = write_bank(&dir, "a", &skewed_bank(10));
        let b = write_bank(&dir, "b", &skewed_bank(6));
        let runner = BalanceRunner::new(42, RunMode::DryRun, full_check());
        let summary = runner.run(&[a, b]);
        assert_eq!(summary.total_questions(), 16);
        assert_eq!(summary.before().counts(), &[16, 0, 0, 0]);
        assert_eq!(summary.after().total(), 16);
        assert!(summary.is_clean());
    }

    // ========================================================================
    // VerifyRunner
    // ========================================================================

    #[test]
    fn test_verify_after_apply_is_clean() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "people", &skewed_bank(25));
        BalanceRunner::new(42, RunMode::Apply, full_check()).run_bank(0, &entry).expect("apply");

        let summary = VerifyRunner::new(full_check()).run(std::slice::from_ref(&entry));
        assert_eq!(summary.banks.len(), 1);
        assert_eq!(summary.sampled(), 25);
        assert_eq!(summary.passed(), 25);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let dir = TempDir::new().expect("temp dir");
        let original = skewed_bank(5);
        let entry = write_bank(&dir, "people", &original);
        std::fs::write(entry.backup_path(), to_json(&original).expect("serialize")).expect("write backup");

        let mut tampered = original;
        tampered[2].set_choices(["wrong 2.1", "right 2", "wrong 2.2", "wrong 2.3"]);
        std::fs::write(&entry.path, to_json(&tampered).expect("serialize")).expect("write bank");

        let summary = VerifyRunner::new(full_check()).run(std::slice::from_ref(&entry));
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_clean());
        let failure = summary.banks[0].verification.failures().next().expect("one failure");
        assert_eq!(failure.position, 2);
    }

    #[test]
    fn test_verify_without_backup_is_skipped() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "fresh", &skewed_bank(3));
        let summary = VerifyRunner::default().run(&[entry]);
        assert!(summary.banks.is_empty());
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].reason.contains("fresh.backup.json"));
    }

    #[test]
    fn test_verify_length_mismatch_is_skipped() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "short", &skewed_bank(2));
        std::fs::write(entry.backup_path(), to_json(&skewed_bank(3)).expect("serialize")).expect("write backup");
        let summary = VerifyRunner::default().run(&[entry]);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].reason.contains("count mismatch"));
    }

    // ========================================================================
    // analyze_banks
    // ========================================================================

    #[test]
    fn test_analyze_banks() {
        let dir = TempDir::new().expect("temp dir");
        let a = write_bank(&dir, "a", &skewed_bank(3));
        let mut moved = skewed_bank(2);
        moved[0].set_correct_answer_index(2);
        let b = write_bank(&dir, "b", &moved);
        let missing = BankEntry::new("c", dir.path().join("c.json"));

        let summary = analyze_banks(&[a, b, missing]);
        assert_eq!(summary.banks.len(), 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.combined().counts(), &[4, 0, 1, 0]);
        // Nothing was written.
        assert!(!dir.path().join("a.backup.json").exists());
    }

    // ========================================================================
    // compare_question
    // ========================================================================

    #[test]
    fn test_compare_question() {
        let dir = TempDir::new().expect("temp dir");
        let entry = write_bank(&dir, "people", &skewed_bank(4));
        BalanceRunner::new(42, RunMode::Apply, full_check()).run_bank(0, &entry).expect("apply");

        let comparison = compare_question(&entry.path, 3).expect("compare");
        assert_eq!(comparison.original.identifier(), "q-3");
        assert_eq!(comparison.transformed.correct_answer(), Some("right 3"));
        assert!(comparison.result.passed);

        let err = compare_question(&entry.path, 4).expect_err("out of range");
        assert!(matches!(err, RunnerError::IndexOutOfRange { index: 4, len: 4 }));
    }
}
