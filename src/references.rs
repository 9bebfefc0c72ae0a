//! Answer-letter reference matching in free text.
//!
//! Explanations cite choices by letter ("A: ...", "Option B is ...", "(C)").
//! This module finds those citations so they can be counted and rewritten.
//!
//! All forms are matched by a single alternation scanned left to right, so a
//! letter occurrence produces at most one reference. Keyword forms win over
//! the parenthesized form, which wins over the punctuation forms:
//! `"Option A:"` is one reference, not two.

use crate::question::letter_to_index;
use regex::{Captures, Regex};
use serde::Serialize;
use std::ops::Range;
use std::sync::OnceLock;

/// Keyword that can introduce a letter reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Keyword {
    Option,
    Answer,
    Choice,
}

/// Syntactic context a reference was recognized in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceContext {
    /// `A:`
    Colon,
    /// `A.` followed by whitespace
    Period,
    /// `A,`
    Comma,
    /// `(A)`
    Parenthesized,
    /// `A)`
    ClosingParen,
    /// `Option A`, `Answer A`, `Choice A`
    Keyword(Keyword),
}

/// One recognized letter reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterReference {
    /// Referenced letter (A-D)
    pub letter: char,
    /// Position the letter denotes
    pub index: usize,
    /// Byte span of the letter alone
    pub letter_span: Range<usize>,
    /// Byte span of the whole matched context
    pub span: Range<usize>,
    /// Context the letter was recognized in
    pub context: ReferenceContext,
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?x)
              \b(?P<keyword>Option|Answer|Choice)\s+(?P<kw_letter>[ABCD])\b
            | \((?P<paren_letter>[ABCD])\)
            | \b(?P<letter>[ABCD])(?P<punct>:|\.\s|,|\))
            ",
        )
        .expect("reference pattern is a valid regex")
    })
}

fn to_reference(caps: &Captures<'_>) -> Option<LetterReference> {
    let whole = caps.get(0)?;

    let (letter_match, context) = if let Some(letter) = caps.name("kw_letter") {
        let keyword = match caps.name("keyword")?.as_str() {
            "Option" => Keyword::Option,
            "Answer" => Keyword::Answer,
            _ => Keyword::Choice,
        };
        (letter, ReferenceContext::Keyword(keyword))
    } else if let Some(letter) = caps.name("paren_letter") {
        (letter, ReferenceContext::Parenthesized)
    } else {
        let letter = caps.name("letter")?;
        let context = match caps.name("punct")?.as_str().chars().next()? {
            ':' => ReferenceContext::Colon,
            '.' => ReferenceContext::Period,
            ',' => ReferenceContext::Comma,
            _ => ReferenceContext::ClosingParen,
        };
        (letter, context)
    };

    let letter = letter_match.as_str().chars().next()?;
    Some(LetterReference {
        letter,
        index: letter_to_index(letter)?,
        letter_span: letter_match.range(),
        span: whole.range(),
        context,
    })
}

/// Lazily find every letter reference in `text`, in order of appearance
pub fn find_references(text: &str) -> impl Iterator<Item = LetterReference> + '_ {
    reference_pattern()
        .captures_iter(text)
        .filter_map(|caps| to_reference(&caps))
}

/// Number of letter references in `text`
#[must_use]
pub fn count_references(text: &str) -> usize {
    find_references(text).count()
}

/// Referenced letters in order of appearance
#[must_use]
pub fn reference_letters(text: &str) -> Vec<char> {
    find_references(text).map(|r| r.letter).collect()
}
