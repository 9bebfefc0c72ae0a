//! Integrity verification of shuffled questions.
//!
//! Compares an original record with its transformed counterpart and
//! certifies that only positions changed:
//!
//! 1. the choice multiset is preserved
//! 2. the correct answer's content is preserved
//! 3. the correct index points at the original correct text
//! 4. the question text is untouched
//! 5. explanation reference counts are stable (warning only)
//!
//! [`SpotChecker`] runs this over a seeded random sample of a bank and
//! collects every finding instead of stopping at the first.

use crate::question::QuestionRecord;
use crate::references::reference_letters;
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

const PREVIEW_CHARS: usize = 50;

/// Shorten long choice text for messages
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// Fatal finding for one question
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityViolation {
    #[error("Choice content mismatch: missing {missing:?}, added {added:?}")]
    ChoicesMismatch {
        missing: Vec<String>,
        added: Vec<String>,
    },

    #[error(
        "Correct answer content mismatch: original ({original_index}) {:?}, transformed ({transformed_index}) {:?}",
        preview(.original),
        preview(.transformed)
    )]
    CorrectContentMismatch {
        original_index: usize,
        original: String,
        transformed_index: usize,
        transformed: String,
    },

    #[error("Transformed correctAnswerIndex {index:?} does not address a choice")]
    InvalidTransformedIndex { index: Option<Value> },

    #[error("correctAnswerIndex mismatch: recorded {recorded}, actual position of correct answer {actual}")]
    IndexMismatch { recorded: usize, actual: usize },

    #[error("Original correct answer {:?} not found in transformed choices", preview(.answer))]
    CorrectAnswerMissing { answer: String },

    #[error("Question text was modified")]
    QuestionTextChanged,
}

/// Non-fatal finding for one question
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReferenceDrift {
    #[error("Letter reference count changed: {original} -> {transformed}")]
    CountChanged { original: usize, transformed: usize },
}

/// Itemized check outcomes; `None` means not applicable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityChecks {
    pub choices_preserved: bool,
    pub correct_content_preserved: Option<bool>,
    pub index_correctly_updated: Option<bool>,
    pub question_text_preserved: bool,
    pub references_stable: bool,
}

/// Verification outcome for one question pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Position of the question within its bank
    pub position: usize,
    /// Identifier of the original record
    pub question_id: String,
    /// No fatal findings
    pub passed: bool,
    /// Fatal findings
    pub errors: Vec<IntegrityViolation>,
    /// Non-fatal findings
    pub warnings: Vec<ReferenceDrift>,
    /// Itemized checks
    pub checks: IntegrityChecks,
    /// Letters referenced by the original explanation
    pub original_refs: Vec<char>,
    /// Letters referenced by the transformed explanation
    pub transformed_refs: Vec<char>,
}

impl VerificationResult {
    /// Whether any warning was raised
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Choices present in `left` more often than in `right`
fn multiset_difference(left: &[&str], right: &[&str]) -> Vec<String> {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for choice in right {
        *remaining.entry(choice).or_default() += 1;
    }
    let mut extra = Vec::new();
    for choice in left {
        match remaining.get_mut(choice) {
            Some(n) if *n > 0 => *n -= 1,
            _ => extra.push((*choice).to_string()),
        }
    }
    extra
}

/// Verify one (original, transformed) pair
#[must_use]
pub fn verify_question(
    position: usize,
    original: &QuestionRecord,
    transformed: &QuestionRecord,
) -> VerificationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let orig_choices = original.choices();
    let upd_choices = transformed.choices();

    // 1. Choice multiset
    let missing = multiset_difference(&orig_choices, &upd_choices);
    let added = multiset_difference(&upd_choices, &orig_choices);
    let choices_preserved = missing.is_empty() && added.is_empty();
    if !choices_preserved {
        errors.push(IntegrityViolation::ChoicesMismatch { missing, added });
    }

    let mut correct_content_preserved = None;
    let mut index_correctly_updated = None;

    if let Some(orig_index) = original.correct_index() {
        let orig_answer = orig_choices[orig_index];
        let upd_index = transformed.correct_index();

        // 2. Correct content
        let content_ok = match upd_index {
            Some(upd_index) => {
                let upd_answer = upd_choices[upd_index];
                if upd_answer != orig_answer {
                    errors.push(IntegrityViolation::CorrectContentMismatch {
                        original_index: orig_index,
                        original: orig_answer.to_string(),
                        transformed_index: upd_index,
                        transformed: upd_answer.to_string(),
                    });
                }
                upd_answer == orig_answer
            }
            None => {
                errors.push(IntegrityViolation::InvalidTransformedIndex {
                    index: transformed.get("correctAnswerIndex").cloned(),
                });
                false
            }
        };
        correct_content_preserved = Some(content_ok);

        // 3. Index points at the original correct text
        let index_ok = match upd_choices.iter().position(|&c| c == orig_answer) {
            Some(actual) => match upd_index {
                Some(recorded) if recorded == actual => true,
                Some(recorded) => {
                    errors.push(IntegrityViolation::IndexMismatch { recorded, actual });
                    false
                }
                None => false,
            },
            None => {
                errors.push(IntegrityViolation::CorrectAnswerMissing {
                    answer: orig_answer.to_string(),
                });
                false
            }
        };
        index_correctly_updated = Some(index_ok);
    }

    // 4. Question text
    let question_text_preserved = original.get("questionText") == transformed.get("questionText");
    if !question_text_preserved {
        errors.push(IntegrityViolation::QuestionTextChanged);
    }

    // 5. Reference stability
    let original_refs = reference_letters(original.explanation_text());
    let transformed_refs = reference_letters(transformed.explanation_text());
    let references_stable = original_refs.len() == transformed_refs.len();
    if !references_stable {
        warnings.push(ReferenceDrift::CountChanged {
            original: original_refs.len(),
            transformed: transformed_refs.len(),
        });
    }

    VerificationResult {
        position,
        question_id: original.identifier(),
        passed: errors.is_empty(),
        errors,
        warnings,
        checks: IntegrityChecks {
            choices_preserved,
            correct_content_preserved,
            index_correctly_updated,
            question_text_preserved,
            references_stable,
        },
        original_refs,
        transformed_refs,
    }
}

/// Errors that prevent a bank from being spot-checked at all
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("Question count mismatch: original {original}, transformed {transformed}")]
    LengthMismatch { original: usize, transformed: usize },

    #[error("Identifier mismatch at position {position}: original {original}, transformed {transformed}")]
    IdentifierMismatch {
        position: usize,
        original: String,
        transformed: String,
    },

    #[error("Sample fraction must be in (0, 1], got {0}")]
    InvalidSampleFraction(f64),
}

/// Spot-check settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotCheckConfig {
    /// Fraction of the bank to sample
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,
    /// Seed for sample selection
    #[serde(default = "default_verify_seed")]
    pub seed: u64,
    /// Failures listed in detail per bank
    #[serde(default = "default_max_reported_failures")]
    pub max_reported_failures: usize,
}

const fn default_sample_fraction() -> f64 {
    0.05
}
const fn default_verify_seed() -> u64 {
    123
}
const fn default_max_reported_failures() -> usize {
    5
}

impl Default for SpotCheckConfig {
    fn default() -> Self {
        Self {
            sample_fraction: default_sample_fraction(),
            seed: default_verify_seed(),
            max_reported_failures: default_max_reported_failures(),
        }
    }
}

impl SpotCheckConfig {
    /// Check the sample fraction is in (0, 1]
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::InvalidSampleFraction` otherwise.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.sample_fraction > 0.0 && self.sample_fraction <= 1.0 {
            Ok(())
        } else {
            Err(VerifyError::InvalidSampleFraction(self.sample_fraction))
        }
    }
}

/// Spot-check result for one bank
#[derive(Debug, Clone, Serialize)]
pub struct BankVerification {
    /// Questions in the bank
    pub total: usize,
    /// Questions checked
    pub sample_size: usize,
    /// Checked positions, ascending
    pub sample_indices: Vec<usize>,
    /// Checked questions without fatal findings
    pub passed: usize,
    /// Checked questions with fatal findings
    pub failed: usize,
    /// Checked questions with warnings
    pub warnings: usize,
    /// Per-question outcomes, in sample order
    pub results: Vec<VerificationResult>,
}

impl BankVerification {
    /// Results with fatal findings
    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Share of sampled questions that passed
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self) -> f64 {
        if self.sample_size == 0 {
            return 1.0;
        }
        self.passed as f64 / self.sample_size as f64
    }

    /// No sampled question failed
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Sampled bank verifier
#[derive(Debug, Clone, Default)]
pub struct SpotChecker {
    config: SpotCheckConfig,
}

impl SpotChecker {
    /// Create a checker
    #[must_use]
    pub const fn new(config: SpotCheckConfig) -> Self {
        Self { config }
    }

    /// Settings in use
    #[must_use]
    pub const fn config(&self) -> &SpotCheckConfig {
        &self.config
    }

    /// Number of questions to check in a bank of `len`
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn sample_size(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let wanted = (len as f64 * self.config.sample_fraction).floor() as usize;
        wanted.clamp(1, len)
    }

    /// Sorted positions to check in a bank of `len`
    #[must_use]
    pub fn sample_indices(&self, len: usize) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut indices = index::sample(&mut rng, len, self.sample_size(len)).into_vec();
        indices.sort_unstable();
        indices
    }

    /// Spot-check a transformed bank against its original
    ///
    /// # Errors
    ///
    /// Returns an error if the sample fraction is invalid, or if the banks
    /// differ in length or in identifier order.
    pub fn verify_bank(
        &self,
        original: &[QuestionRecord],
        transformed: &[QuestionRecord],
    ) -> Result<BankVerification, VerifyError> {
        self.config.validate()?;

        if original.len() != transformed.len() {
            return Err(VerifyError::LengthMismatch {
                original: original.len(),
                transformed: transformed.len(),
            });
        }
        for (position, (orig, upd)) in original.iter().zip(transformed).enumerate() {
            if orig.id() != upd.id() || orig.domain_id() != upd.domain_id() {
                return Err(VerifyError::IdentifierMismatch {
                    position,
                    original: orig.identifier(),
                    transformed: upd.identifier(),
                });
            }
        }

        let sample_indices = self.sample_indices(original.len());
        let results: Vec<VerificationResult> = sample_indices
            .iter()
            .map(|&i| verify_question(i, &original[i], &transformed[i]))
            .collect();

        let passed = results.iter().filter(|r| r.passed).count();
        let warnings = results.iter().filter(|r| r.has_warnings()).count();

        for failure in results.iter().filter(|r| !r.passed) {
            tracing::error!(
                position = failure.position,
                question = %failure.question_id,
                errors = failure.errors.len(),
                "Integrity check failed"
            );
        }

        Ok(BankVerification {
            total: original.len(),
            sample_size: sample_indices.len(),
            passed,
            failed: results.len() - passed,
            warnings,
            sample_indices,
            results,
        })
    }
}
