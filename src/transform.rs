//! Per-question transformation: shuffle choices, relocate the correct index,
//! rewrite explanation references.
//!
//! Every function here builds a new record; inputs are never mutated. Only
//! `choices`, `correctAnswerIndex` and `explanation` are overwritten, in place,
//! so every other key keeps its value and position.
//! [`QuestionTransformer`] gives each bank position its own ChaCha8 stream,
//! so a bank transforms identically regardless of processing order.

use crate::question::QuestionRecord;
use crate::rewrite::rewrite_references;
use crate::shuffle::{shuffle_choices, PositionMapping};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A transformed record with the mapping that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedQuestion {
    /// New record
    pub question: QuestionRecord,
    /// Old-to-new position mapping (identity for pass-through records)
    pub mapping: PositionMapping,
}

impl TransformedQuestion {
    /// Whether the record was passed through unchanged
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.mapping.is_identity()
    }
}

/// Apply a known mapping to `question`
///
/// Malformed records, and mappings whose length disagrees with the choice
/// count, yield an unchanged copy.
#[must_use]
pub fn transform_with_mapping(question: &QuestionRecord, mapping: &PositionMapping) -> QuestionRecord {
    let Some(correct) = question.correct_index() else {
        return question.clone();
    };
    if !question.is_shufflable() {
        return question.clone();
    }
    let Some(choices) = mapping.apply(&question.choices()) else {
        return question.clone();
    };
    let Some(new_correct) = mapping.get(correct).and_then(|i| i64::try_from(i).ok()) else {
        return question.clone();
    };

    let mut out = question.clone();
    out.set_choices(choices);
    out.set_correct_answer_index(new_correct);
    if let Some(text) = question.explanation() {
        out.set_explanation(rewrite_references(text, mapping));
    }
    out
}

/// Shuffle `question` with `rng`
pub fn transform_question<R: Rng + ?Sized>(question: &QuestionRecord, rng: &mut R) -> TransformedQuestion {
    let outcome = shuffle_choices(&question.choices(), question.correct_index(), rng);
    if outcome.mapping.is_identity() {
        return TransformedQuestion {
            question: question.clone(),
            mapping: outcome.mapping,
        };
    }
    TransformedQuestion {
        question: transform_with_mapping(question, &outcome.mapping),
        mapping: outcome.mapping,
    }
}

/// Seeded, order-independent bank transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTransformer {
    seed: u64,
}

impl QuestionTransformer {
    /// Create a transformer for `seed`
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed in use
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator dedicated to one bank position
    #[must_use]
    pub fn rng_for(&self, position: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(position as u64);
        rng
    }

    /// Transform the question at `position`
    #[must_use]
    pub fn transform(&self, position: usize, question: &QuestionRecord) -> TransformedQuestion {
        let mut rng = self.rng_for(position);
        transform_question(question, &mut rng)
    }

    /// Transform a whole bank; output has the same length and order
    #[must_use]
    pub fn transform_bank(&self, questions: &[QuestionRecord]) -> Vec<TransformedQuestion> {
        questions
            .iter()
            .enumerate()
            .map(|(position, question)| self.transform(position, question))
            .collect()
    }
}
