//! # Answer Balance
//!
//! Rebalances the correct-answer position of multiple-choice question banks
//! and certifies the result.
//!
//! Banks written by a single author (human or model) tend to put the correct
//! answer in the same slot. This crate shuffles each question's choices,
//! moves the correct index with its content, and rewrites letter references
//! in the explanation ("Option A", "(B)", "C:") so they still point at the
//! right choice. A sampled verifier then checks that only positions changed.
//!
//! ## Architecture
//!
//! ```text
//! Bank JSON (BankSnapshot)
//!        ↓
//! QuestionTransformer (shuffle choices + rewrite references)
//!        ↓
//! SpotChecker (sampled integrity verification)
//!        ↓
//! Backup + atomic overwrite (apply mode)
//!        ↓
//! Report (text | markdown | json)
//! ```

pub mod bank;
pub mod config;
pub mod distribution;
pub mod generate;
pub mod question;
pub mod references;
pub mod report;
pub mod rewrite;
pub mod runner;
pub mod shuffle;
pub mod transform;
pub mod verify;

pub use bank::{backup_path, BankError, BankSnapshot, PersistOutcome};
pub use config::{discover_banks, BalanceConfig, BankEntry, ConfigError};
pub use distribution::{AnswerDistribution, IDEAL_PERCENTAGE};
pub use generate::{
    parse_generated, GenerationError, GenerationPlan, GenerationRun, GenerationSummary,
    QuestionSource,
};
pub use question::{index_to_letter, letter_to_index, QuestionRecord, CHOICE_COUNT, LETTERS};
pub use references::{
    count_references, find_references, reference_letters, Keyword, LetterReference,
    ReferenceContext,
};
pub use report::{render_comparison, AnalysisReport, BalanceReport, ReportMetadata, VerificationReport};
pub use rewrite::rewrite_references;
pub use runner::{
    analyze_banks, compare_question, AnalysisSummary, BalanceRunner, BalanceSummary,
    BankRunResult, QuestionComparison, RunMode, RunnerError, SkippedBank, VerificationSummary,
    VerifyRunner,
};
pub use shuffle::{shuffle_choices, PositionMapping, ShuffleOutcome};
pub use transform::{transform_question, transform_with_mapping, QuestionTransformer, TransformedQuestion};
pub use verify::{
    verify_question, BankVerification, IntegrityChecks, IntegrityViolation, ReferenceDrift,
    SpotCheckConfig, SpotChecker, VerificationResult, VerifyError,
};
