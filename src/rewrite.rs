//! Explanation letter-reference rewriting.
//!
//! Rewriting happens in two phases so that a reference is moved exactly once
//! no matter how the mapping cycles:
//!
//! 1. **protect**: split the text into literal segments and slots. Each slot
//!    is an index into a side table holding the old position it stood for.
//! 2. **resolve**: emit literals verbatim and every slot as the letter of its
//!    mapped position.
//!
//! Because slots are table indices rather than text, a resolved letter can
//! never be picked up again by a later substitution (`A->B, B->A` swaps
//! cleanly instead of collapsing to all `A`).

use crate::question::index_to_letter;
use crate::references::find_references;
use crate::shuffle::PositionMapping;
use std::borrow::Cow;

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Slot(usize),
}

/// Text with every rewritable letter replaced by a slot
#[derive(Debug)]
struct ProtectedText<'a> {
    segments: Vec<Segment<'a>>,
    /// Old position for each slot
    slots: Vec<usize>,
}

impl<'a> ProtectedText<'a> {
    fn protect(text: &'a str, mapping: &PositionMapping) -> Self {
        let mut segments = Vec::new();
        let mut slots = Vec::new();
        let mut cursor = 0;

        for reference in find_references(text) {
            let destination = mapping.get(reference.index).and_then(index_to_letter);
            if destination.is_none() {
                continue;
            }
            let span = reference.letter_span;
            if span.start > cursor {
                segments.push(Segment::Text(&text[cursor..span.start]));
            }
            segments.push(Segment::Slot(slots.len()));
            slots.push(reference.index);
            cursor = span.end;
        }
        if cursor < text.len() {
            segments.push(Segment::Text(&text[cursor..]));
        }

        Self { segments, slots }
    }

    fn resolve(&self, mapping: &PositionMapping) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match *segment {
                Segment::Text(s) => out.push_str(s),
                Segment::Slot(slot) => {
                    let letter = mapping
                        .get(self.slots[slot])
                        .and_then(index_to_letter)
                        .unwrap_or('?');
                    out.push(letter);
                }
            }
        }
        out
    }
}

/// Rewrite every recognized letter reference in `text` through `mapping`
///
/// Returns the input unchanged (borrowed) for empty text or an identity
/// mapping.
#[must_use]
pub fn rewrite_references<'a>(text: &'a str, mapping: &PositionMapping) -> Cow<'a, str> {
    if text.is_empty() || mapping.is_identity() {
        return Cow::Borrowed(text);
    }
    let protected = ProtectedText::protect(text, mapping);
    if protected.slots.is_empty() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(protected.resolve(mapping))
}
