//! Correct-answer position distribution.
//!
//! Counts where the correct answer sits across a bank. A balanced bank holds
//! 25% of its correct answers at each position.

use crate::question::{QuestionRecord, CHOICE_COUNT};
use serde::{Deserialize, Serialize};

/// Share each position would hold in a perfectly balanced bank, in percent
pub const IDEAL_PERCENTAGE: f64 = 100.0 / CHOICE_COUNT as f64;

/// Per-position counts of correct answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDistribution {
    counts: [usize; CHOICE_COUNT],
    total: usize,
    skipped: usize,
}

impl AnswerDistribution {
    /// Empty distribution
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a bank
    #[must_use]
    pub fn from_questions(questions: &[QuestionRecord]) -> Self {
        let mut dist = Self::new();
        for question in questions {
            dist.record(question.correct_index());
        }
        dist
    }

    /// Count one correct index; `None` or out-of-range counts as skipped
    pub fn record(&mut self, index: Option<usize>) {
        match index.and_then(|i| self.counts.get_mut(i)) {
            Some(count) => {
                *count += 1;
                self.total += 1;
            }
            None => self.skipped += 1,
        }
    }

    /// Add another distribution's counts into this one
    pub fn merge(&mut self, other: &Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
        self.total += other.total;
        self.skipped += other.skipped;
    }

    /// Correct answers at `index`
    #[must_use]
    pub fn count(&self, index: usize) -> usize {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// All per-position counts
    #[must_use]
    pub const fn counts(&self) -> &[usize; CHOICE_COUNT] {
        &self.counts
    }

    /// Questions counted
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Questions without a valid correct index
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Share of correct answers at `index`, in percent
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self, index: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(index) as f64 / self.total as f64 * 100.0
    }

    /// Count each position would hold if balanced
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ideal_per_position(&self) -> f64 {
        self.total as f64 / CHOICE_COUNT as f64
    }

    /// Percentage points above (+) or below (-) the ideal share
    #[must_use]
    pub fn deviation_from_ideal(&self, index: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.percentage(index) - IDEAL_PERCENTAGE
    }

    /// Questions above (+) or below (-) the ideal count
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn count_deviation(&self, index: usize) -> f64 {
        self.count(index) as f64 - self.ideal_per_position()
    }

    /// Largest absolute deviation from the ideal share, in percentage points
    #[must_use]
    pub fn max_deviation(&self) -> f64 {
        (0..CHOICE_COUNT)
            .map(|i| self.deviation_from_ideal(i).abs())
            .fold(0.0, f64::max)
    }

    /// Position holding the most correct answers, with its count
    #[must_use]
    pub fn most_common(&self) -> Option<(usize, usize)> {
        if self.total == 0 {
            return None;
        }
        self.counts
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }

    /// Position holding the fewest correct answers, with its count
    #[must_use]
    pub fn least_common(&self) -> Option<(usize, usize)> {
        if self.total == 0 {
            return None;
        }
        self.counts
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn with_index(index: Option<i64>) -> QuestionRecord {
        let mut q = QuestionRecord::new(
            "q",
            "stem",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            "",
        );
        match index {
            Some(index) => q.set_correct_answer_index(index),
            None => {
                q.remove("correctAnswerIndex");
            }
        }
        q
    }

    fn skewed() -> Vec<QuestionRecord> {
        // 6 at A, 2 at B, 1 at C, 1 at D
        [0, 0, 0, 0, 0, 0, 1, 1, 2, 3]
            .iter()
            .map(|&i| with_index(Some(i)))
            .collect()
    }

    #[test]
    fn test_counts_and_percentages() {
        let dist = AnswerDistribution::from_questions(&skewed());
        assert_eq!(dist.counts(), &[6, 2, 1, 1]);
        assert_eq!(dist.total(), 10);
        assert!((dist.percentage(0) - 60.0).abs() < 1e-9);
        assert!((dist.percentage(3) - 10.0).abs() < 1e-9);
        assert!((dist.ideal_per_position() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_deviation() {
        let dist = AnswerDistribution::from_questions(&skewed());
        assert!((dist.deviation_from_ideal(0) - 35.0).abs() < 1e-9);
        assert!((dist.deviation_from_ideal(2) + 15.0).abs() < 1e-9);
        assert!((dist.count_deviation(0) - 3.5).abs() < 1e-9);
        assert!((dist.max_deviation() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_indices_skipped() {
        let bank = vec![with_index(Some(1)), with_index(None), with_index(Some(7)), with_index(Some(-2))];
        let dist = AnswerDistribution::from_questions(&bank);
        assert_eq!(dist.total(), 1);
        assert_eq!(dist.skipped(), 3);
        assert_eq!(dist.count(1), 1);
    }

    #[test]
    fn test_empty_distribution() {
        let dist = AnswerDistribution::new();
        assert_eq!(dist.percentage(0), 0.0);
        assert_eq!(dist.deviation_from_ideal(0), 0.0);
        assert_eq!(dist.max_deviation(), 0.0);
        assert!(dist.most_common().is_none());
        assert!(dist.least_common().is_none());
    }

    #[test]
    fn test_most_and_least_common() {
        let dist = AnswerDistribution::from_questions(&skewed());
        assert_eq!(dist.most_common(), Some((0, 6)));
        // Ties resolve to the lowest position.
        assert_eq!(dist.least_common(), Some((2, 1)));
    }

    #[test]
    fn test_merge() {
        let mut combined = AnswerDistribution::from_questions(&skewed());
        combined.merge(&AnswerDistribution::from_questions(&[with_index(Some(3)), with_index(None)]));
        assert_eq!(combined.counts(), &[6, 2, 1, 2]);
        assert_eq!(combined.total(), 11);
        assert_eq!(combined.skipped(), 1);
    }
}
