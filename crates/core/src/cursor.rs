//! The per-feature document iteration contract
//!
//! This module provides:
//! - FeatureCursor trait implemented by every feature evaluator
//! - MatchAllCursor for constant-valued features
//! - EmptyCursor for features with no match in a segment
//! - SortedDocsCursor over a precomputed posting list
//!
//! Cursors are monotonic: once a cursor has been advanced past a document
//! it never reports that document again. A cursor with no match at all
//! reports [`TERMINATED`] immediately and its feature always falls back to
//! its default value.

use crate::docid::{DocId, TERMINATED};
use crate::error::Result;

// ============================================================================
// FeatureCursor
// ============================================================================

/// Per-feature, per-segment document iterator
///
/// One cursor serves one feature within one query-segment execution. The
/// merge engine positions cursors with [`advance_to`](FeatureCursor::advance_to)
/// and reads [`value`](FeatureCursor::value) only at positions where the
/// cursor matched the document being scored.
///
/// # Thread Safety
///
/// Cursors are NOT thread-safe and must not be shared across concurrently
/// scoring contexts. Each segment execution owns its own cursors.
pub trait FeatureCursor {
    /// Current document, or [`TERMINATED`] once exhausted
    ///
    /// A freshly built cursor is already positioned on its first match.
    fn doc(&self) -> DocId;

    /// Advance to the first document `>= target` and return the document
    /// reached (or [`TERMINATED`])
    ///
    /// Advancing to a target at or before the current position is a no-op
    /// that returns the current position.
    fn advance_to(&mut self, target: DocId) -> DocId;

    /// Feature value at the current position
    ///
    /// Defined only when [`doc`](FeatureCursor::doc) equals the document
    /// being scored. Evaluator failures surface as
    /// [`Error::Evaluation`](crate::Error::Evaluation).
    fn value(&mut self) -> Result<f32>;

    /// Advisory cost estimate (roughly: documents this cursor may visit)
    ///
    /// Used only to order cursors in the merge; never affects correctness.
    fn cost(&self) -> u64;
}

// ============================================================================
// MatchAllCursor
// ============================================================================

/// Cursor that matches every document with a constant value
///
/// Backs constant-valued features and per-request external values, which
/// are defined for all documents of a segment.
#[derive(Debug, Clone)]
pub struct MatchAllCursor {
    value: f32,
    max_doc: DocId,
    doc: DocId,
}

impl MatchAllCursor {
    /// Create a cursor matching documents `0..max_doc`
    pub fn new(value: f32, max_doc: DocId) -> Self {
        MatchAllCursor {
            value,
            max_doc,
            doc: if max_doc == 0 { TERMINATED } else { 0 },
        }
    }

    /// Create a cursor matching every possible document
    pub fn unbounded(value: f32) -> Self {
        MatchAllCursor::new(value, TERMINATED)
    }
}

impl FeatureCursor for MatchAllCursor {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance_to(&mut self, target: DocId) -> DocId {
        if self.doc != TERMINATED && target > self.doc {
            self.doc = if target >= self.max_doc {
                TERMINATED
            } else {
                target
            };
        }
        self.doc
    }

    fn value(&mut self) -> Result<f32> {
        Ok(self.value)
    }

    fn cost(&self) -> u64 {
        u64::from(self.max_doc)
    }
}

// ============================================================================
// EmptyCursor
// ============================================================================

/// Cursor with no matching documents
///
/// Reports [`TERMINATED`] from the start; the merge never reads a value
/// from it, so the owning feature always scores at its default.
#[derive(Debug, Clone, Default)]
pub struct EmptyCursor;

impl EmptyCursor {
    /// Create a cursor with no matches
    pub fn new() -> Self {
        EmptyCursor
    }
}

impl FeatureCursor for EmptyCursor {
    fn doc(&self) -> DocId {
        TERMINATED
    }

    fn advance_to(&mut self, _target: DocId) -> DocId {
        TERMINATED
    }

    fn value(&mut self) -> Result<f32> {
        // Never observed through the merge, which only reads values at
        // matching positions.
        Ok(0.0)
    }

    fn cost(&self) -> u64 {
        0
    }
}

// ============================================================================
// SortedDocsCursor
// ============================================================================

/// Cursor over a precomputed posting list of (document, value) pairs
///
/// The list must be sorted by document id with no duplicates. Useful for
/// hosts that materialize feature matches up front, and for tests.
#[derive(Debug, Clone)]
pub struct SortedDocsCursor {
    postings: Vec<(DocId, f32)>,
    pos: usize,
}

impl SortedDocsCursor {
    /// Create a cursor over sorted (doc, value) postings
    ///
    /// Debug builds assert the ordering invariant.
    pub fn new(postings: Vec<(DocId, f32)>) -> Self {
        debug_assert!(postings.windows(2).all(|w| w[0].0 < w[1].0));
        SortedDocsCursor { postings, pos: 0 }
    }
}

impl FeatureCursor for SortedDocsCursor {
    fn doc(&self) -> DocId {
        match self.postings.get(self.pos) {
            Some(&(doc, _)) => doc,
            None => TERMINATED,
        }
    }

    fn advance_to(&mut self, target: DocId) -> DocId {
        while self.pos < self.postings.len() && self.postings[self.pos].0 < target {
            self.pos += 1;
        }
        self.doc()
    }

    fn value(&mut self) -> Result<f32> {
        Ok(self.postings.get(self.pos).map(|&(_, v)| v).unwrap_or(0.0))
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }
}

// ============================================================================
// Tests
// ============================================================================
