//! Question generation driver.
//!
//! Content comes from an external producer (typically a hosted language
//! model) behind the [`QuestionSource`] trait. [`GenerationRun`] drives it in
//! batches: one topic per batch, an avoid list of recent question texts,
//! failed batches logged and skipped, and an optional checkpoint file
//! rewritten after every successful batch.

use crate::bank::{to_json, write_atomic, BankError};
use crate::question::QuestionRecord;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a producer or while handling its output
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Question source failed: {0}")]
    Source(String),

    #[error("Failed to parse generated questions: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No topics configured")]
    NoTopics,

    #[error("Checkpoint write failed: {0}")]
    Checkpoint(#[from] BankError),
}

/// External producer of raw question records
pub trait QuestionSource {
    /// Produce a batch of questions for `topic` within `domain`
    ///
    /// `avoid` lists question texts the producer should not repeat.
    ///
    /// # Errors
    ///
    /// Returns an error if the producer fails or its output is unusable.
    fn generate(
        &self,
        domain: &str,
        topic: &str,
        avoid: &[String],
    ) -> Result<Vec<QuestionRecord>, GenerationError>;
}

/// Parse raw producer output into records
///
/// Accepts a bare JSON array or one wrapped in a Markdown code fence.
///
/// # Errors
///
/// Returns `GenerationError::Parse` if the text is not a JSON array of records.
pub fn parse_generated(text: &str) -> Result<Vec<QuestionRecord>, GenerationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map_or(trimmed, |rest| rest.strip_suffix("```").unwrap_or(rest))
        .trim();
    Ok(serde_json::from_str(body)?)
}

/// What to generate
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    /// Domain passed to the producer
    pub domain: String,
    /// Topics to rotate through
    pub topics: Vec<String>,
    /// Number of batches to request
    pub batches: usize,
    /// Seed for topic selection
    pub seed: u64,
    /// How many recent question texts form the avoid list
    pub avoid_window: usize,
    /// File rewritten after each successful batch
    pub checkpoint: Option<PathBuf>,
}

impl GenerationPlan {
    /// Plan `batches` batches over `topics`
    #[must_use]
    pub fn new(domain: impl Into<String>, topics: Vec<String>, batches: usize) -> Self {
        Self {
            domain: domain.into(),
            topics,
            batches,
            seed: 42,
            avoid_window: 50,
            checkpoint: None,
        }
    }

    /// Set the checkpoint file
    #[must_use]
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// Set the topic selection seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    /// Everything generated, in batch order
    pub questions: Vec<QuestionRecord>,
    /// Batches that produced questions
    pub batches_ok: usize,
    /// Batches whose producer call failed
    pub batches_failed: usize,
}

/// Batch driver for a [`QuestionSource`]
pub struct GenerationRun<'a, S: QuestionSource + ?Sized> {
    source: &'a S,
    plan: GenerationPlan,
}

impl<'a, S: QuestionSource + ?Sized> GenerationRun<'a, S> {
    /// Create a run
    #[must_use]
    pub const fn new(source: &'a S, plan: GenerationPlan) -> Self {
        Self { source, plan }
    }

    fn avoid_list(&self, questions: &[QuestionRecord]) -> Vec<String> {
        let start = questions.len().saturating_sub(self.plan.avoid_window);
        questions[start..]
            .iter()
            .filter_map(|q| q.question_text().map(str::to_string))
            .collect()
    }

    /// Request every planned batch
    ///
    /// Producer failures are logged and counted; the run continues.
    ///
    /// # Errors
    ///
    /// Returns an error if no topics are configured or a checkpoint write
    /// fails.
    pub fn run(&self) -> Result<GenerationSummary, GenerationError> {
        if self.plan.topics.is_empty() {
            return Err(GenerationError::NoTopics);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.plan.seed);
        let mut summary = GenerationSummary::default();

        for batch in 1..=self.plan.batches {
            let Some(topic) = self.plan.topics.choose(&mut rng) else {
                break;
            };
            tracing::info!(
                batch = batch,
                batches = self.plan.batches,
                domain = %self.plan.domain,
                topic = %topic,
                "Requesting batch"
            );

            let avoid = self.avoid_list(&summary.questions);
            match self.source.generate(&self.plan.domain, topic, &avoid) {
                Ok(questions) => {
                    summary.questions.extend(questions);
                    summary.batches_ok += 1;
                    if let Some(path) = &self.plan.checkpoint {
                        write_atomic(path, &to_json(&summary.questions)?)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(batch = batch, topic = %topic, error = %e, "Batch failed");
                    summary.batches_failed += 1;
                }
            }
        }

        tracing::info!(
            questions = summary.questions.len(),
            ok = summary.batches_ok,
            failed = summary.batches_failed,
            "Generation finished"
        );
        Ok(summary)
    }
}
