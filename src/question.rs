//! Question record model.
//!
//! A record is one multiple-choice question as stored in a bank file. It is
//! kept as the ordered JSON object it was read from, so any record, valid or
//! not, serializes back with the same keys, values and key order. The fields
//! the shuffle engine needs are read through lenient accessors: a value of
//! the wrong type reads as absent and the record is treated as malformed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Answer letters, in position order
pub const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Number of positions addressable by a letter
pub const CHOICE_COUNT: usize = LETTERS.len();

const ID: &str = "id";
const DOMAIN_ID: &str = "domainId";
const QUESTION_TEXT: &str = "questionText";
const CHOICES: &str = "choices";
const CORRECT_ANSWER_INDEX: &str = "correctAnswerIndex";
const EXPLANATION: &str = "explanation";

/// Convert a zero-based position to its answer letter
#[must_use]
pub fn index_to_letter(index: usize) -> Option<char> {
    LETTERS.get(index).copied()
}

/// Convert an answer letter to its zero-based position
#[must_use]
pub fn letter_to_index(letter: char) -> Option<usize> {
    LETTERS.iter().position(|&l| l == letter)
}

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct QuestionRecord {
    fields: Map<String, Value>,
}

impl QuestionRecord {
    /// Create a record from its core fields
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        question_text: impl Into<String>,
        choices: Vec<String>,
        correct_answer_index: usize,
        explanation: impl Into<String>,
    ) -> Self {
        let mut record = Self::default();
        record.insert(ID, Value::String(id.into()));
        record.insert(QUESTION_TEXT, Value::String(question_text.into()));
        record.set_choices(choices);
        record.insert(CORRECT_ANSWER_INDEX, correct_answer_index);
        record.set_explanation(explanation);
        record
    }

    /// All fields in their original order
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw value of `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set `key`; an existing key keeps its position
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.to_string(), value.into())
    }

    /// Remove `key`
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    fn non_null(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|value| !value.is_null())
    }

    /// Generic identifier
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.non_null(ID)
    }

    /// Identifier assigned by the question generator
    #[must_use]
    pub fn domain_id(&self) -> Option<&Value> {
        self.non_null(DOMAIN_ID)
    }

    /// Human-readable identifier: `domainId`, then `id`, then `"<unknown>"`
    #[must_use]
    pub fn identifier(&self) -> String {
        match self.domain_id().or_else(|| self.id()) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "<unknown>".to_string(),
        }
    }

    /// Question stem, if it is a string
    #[must_use]
    pub fn question_text(&self) -> Option<&str> {
        self.get(QUESTION_TEXT).and_then(Value::as_str)
    }

    /// Choices; empty when absent or when any entry is not a string
    #[must_use]
    pub fn choices(&self) -> Vec<&str> {
        self.get(CHOICES)
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
            .unwrap_or_default()
    }

    /// Replace the choices in place
    pub fn set_choices<S: Into<String>>(&mut self, choices: impl IntoIterator<Item = S>) {
        let choices: Vec<Value> = choices.into_iter().map(|c| Value::String(c.into())).collect();
        self.insert(CHOICES, choices);
    }

    /// Recorded `correctAnswerIndex`, if it is an integer
    #[must_use]
    pub fn correct_answer_index(&self) -> Option<i64> {
        self.get(CORRECT_ANSWER_INDEX).and_then(Value::as_i64)
    }

    /// Replace `correctAnswerIndex` in place
    pub fn set_correct_answer_index(&mut self, index: i64) {
        self.insert(CORRECT_ANSWER_INDEX, index);
    }

    /// Explanation, if it is a string
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.get(EXPLANATION).and_then(Value::as_str)
    }

    /// Explanation text, or `""` when absent
    #[must_use]
    pub fn explanation_text(&self) -> &str {
        self.explanation().unwrap_or_default()
    }

    /// Replace the explanation in place
    pub fn set_explanation(&mut self, explanation: impl Into<String>) {
        self.insert(EXPLANATION, explanation.into());
    }

    /// Correct index if it addresses an existing choice with a letter
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        let index = usize::try_from(self.correct_answer_index()?).ok()?;
        (index < self.choices().len() && index < CHOICE_COUNT).then_some(index)
    }

    /// Content of the correct choice
    #[must_use]
    pub fn correct_answer(&self) -> Option<&str> {
        let index = self.correct_index()?;
        self.choices().get(index).copied()
    }

    /// Whether the shuffle engine can operate on this record
    #[must_use]
    pub fn is_shufflable(&self) -> bool {
        let len = self.choices().len();
        (2..=CHOICE_COUNT).contains(&len) && self.correct_index().is_some()
    }
}
