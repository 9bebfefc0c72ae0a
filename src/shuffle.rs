//! Choice shuffling and position bookkeeping.
//!
//! A shuffle draws a uniform permutation of a question's positions and
//! records it as a [`PositionMapping`] from old position to new position.
//! The mapping drives both the correct-index relocation and the rewriting of
//! letter references in the explanation.

use crate::question::CHOICE_COUNT;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Bijection from old choice position to new choice position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionMapping {
    old_to_new: Vec<usize>,
}

impl PositionMapping {
    /// Mapping that leaves `len` positions in place
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            old_to_new: (0..len).collect(),
        }
    }

    /// Build from an explicit old-to-new table
    ///
    /// Returns `None` unless the table is a permutation of `0..len`.
    #[must_use]
    pub fn from_old_to_new(old_to_new: Vec<usize>) -> Option<Self> {
        let mapping = Self { old_to_new };
        mapping.is_bijection().then_some(mapping)
    }

    /// Build from a shuffled order, where `order[new] == old`
    ///
    /// Returns `None` unless `order` is a permutation of `0..len`.
    #[must_use]
    pub fn from_order(order: &[usize]) -> Option<Self> {
        let mut old_to_new = vec![usize::MAX; order.len()];
        for (new, &old) in order.iter().enumerate() {
            let slot = old_to_new.get_mut(old)?;
            if *slot != usize::MAX {
                return None;
            }
            *slot = new;
        }
        Some(Self { old_to_new })
    }

    /// New position of `old`
    #[must_use]
    pub fn get(&self, old: usize) -> Option<usize> {
        self.old_to_new.get(old).copied()
    }

    /// Number of positions covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    /// Whether the mapping covers no positions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }

    /// Whether every position maps to itself
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.old_to_new.iter().enumerate().all(|(old, &new)| old == new)
    }

    /// Whether the table is a permutation of `0..len`
    #[must_use]
    pub fn is_bijection(&self) -> bool {
        let mut seen = vec![false; self.old_to_new.len()];
        self.old_to_new.iter().all(|&new| match seen.get_mut(new) {
            Some(hit) if !*hit => {
                *hit = true;
                true
            }
            _ => false,
        })
    }

    /// `(old, new)` pairs in old-position order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.old_to_new.iter().copied().enumerate()
    }

    /// Reorder `items` so that `items[old]` lands at `mapping[old]`
    ///
    /// Returns `None` if `items` and the mapping differ in length.
    #[must_use]
    pub fn apply<T: Clone>(&self, items: &[T]) -> Option<Vec<T>> {
        if items.len() != self.len() {
            return None;
        }
        let mut order = vec![0; self.len()];
        for (old, new) in self.iter() {
            order[new] = old;
        }
        Some(order.into_iter().map(|old| items[old].clone()).collect())
    }
}

/// Output of a single shuffle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleOutcome<T = String> {
    /// Reordered choices
    pub choices: Vec<T>,
    /// Relocated correct index (unchanged input on a no-op)
    pub correct_index: Option<usize>,
    /// Old-to-new mapping that was applied
    pub mapping: PositionMapping,
}

impl<T: Clone> ShuffleOutcome<T> {
    fn unchanged(choices: &[T], correct_index: Option<usize>) -> Self {
        Self {
            choices: choices.to_vec(),
            correct_index,
            mapping: PositionMapping::identity(choices.len()),
        }
    }
}

/// Shuffle `choices` with `rng` and relocate `correct_index`
///
/// Records with fewer than two choices, more choices than answer letters, or
/// a missing or out-of-range correct index come back unchanged with an
/// identity mapping.
pub fn shuffle_choices<T: Clone, R: Rng + ?Sized>(
    choices: &[T],
    correct_index: Option<usize>,
    rng: &mut R,
) -> ShuffleOutcome<T> {
    let len = choices.len();
    let Some(correct) = correct_index.filter(|&i| i < len) else {
        return ShuffleOutcome::unchanged(choices, correct_index);
    };
    if !(2..=CHOICE_COUNT).contains(&len) {
        return ShuffleOutcome::unchanged(choices, correct_index);
    }

    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);

    let new_choices = order.iter().map(|&old| choices[old].clone()).collect();
    let Some(mapping) = PositionMapping::from_order(&order) else {
        return ShuffleOutcome::unchanged(choices, correct_index);
    };

    ShuffleOutcome {
        choices: new_choices,
        correct_index: mapping.get(correct),
        mapping,
    }
}
