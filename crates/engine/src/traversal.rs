//! The cursor merge engine
//!
//! This module provides:
//! - SubCursor: a feature cursor tagged with the slot it serves
//! - DegenerateTraversal: traversal over zero or one cursor
//! - PriorityTraversal: k-way merge over two or more cursors
//! - Traversal: strategy selection, done once per segment execution
//!
//! Both strategies track two positions. `active` is the document the
//! underlying cursors have actually reached (the minimum across them);
//! `target` is the document the caller most recently requested. They are
//! intentionally decoupled: `advance_to` always reports the requested
//! target, so the model produces a score for every candidate document,
//! while cursors only move when they can still contribute. Because cursors
//! are monotonic and `active` is a true minimum, `active > target` proves
//! that no cursor can ever match `target`, and the document is scored from
//! the all-default vector with no further cursor work.

use crate::vector::FeatureVector;
use rescore_core::cursor::FeatureCursor;
use rescore_core::{DocId, Error, Result, TERMINATED};
use smallvec::SmallVec;

// ============================================================================
// SubCursor
// ============================================================================

/// A feature cursor tagged with the vector slot it populates
pub struct SubCursor {
    /// Extraction position this cursor's feature occupies in the vector
    pub slot: usize,
    /// The underlying cursor
    pub cursor: Box<dyn FeatureCursor>,
}

impl SubCursor {
    /// Tag a cursor with its vector slot
    pub fn new(slot: usize, cursor: Box<dyn FeatureCursor>) -> Self {
        SubCursor { slot, cursor }
    }
}

fn matched_value(sub: &mut SubCursor, vector: &mut FeatureVector) -> Result<()> {
    let value = sub.cursor.value().map_err(|source| {
        Error::evaluation(vector.slot(sub.slot).name(), source.to_string())
    })?;
    vector.set_matched(sub.slot, value);
    Ok(())
}

// ============================================================================
// DegenerateTraversal
// ============================================================================

/// Traversal over at most one cursor
///
/// With zero cursors every document scores from the all-default vector;
/// with one cursor the slot is populated whenever that cursor sits exactly
/// on the requested document.
pub struct DegenerateTraversal {
    cursor: Option<SubCursor>,
    active: DocId,
    target: Option<DocId>,
}

impl DegenerateTraversal {
    fn new(cursor: Option<SubCursor>) -> Self {
        let active = cursor
            .as_ref()
            .map_or(TERMINATED, |sub| sub.cursor.doc());
        DegenerateTraversal {
            cursor,
            active,
            target: None,
        }
    }

    fn advance_to(&mut self, target: DocId) -> DocId {
        if self.active <= target {
            self.active = match &mut self.cursor {
                Some(sub) => sub.cursor.advance_to(target),
                None => TERMINATED,
            };
        }
        self.target = Some(target);
        target
    }

    fn fill_matches(&mut self, vector: &mut FeatureVector) -> Result<()> {
        if self.target == Some(self.active) {
            if let Some(sub) = &mut self.cursor {
                matched_value(sub, vector)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// PriorityTraversal
// ============================================================================

/// K-way merge over two or more cursors
///
/// `active` is maintained as the minimum current document across all
/// cursors. The tied set (cursors sharing that minimum) is rebuilt per
/// score request from the cursor list.
pub struct PriorityTraversal {
    cursors: Vec<SubCursor>,
    active: DocId,
    target: Option<DocId>,
}

impl PriorityTraversal {
    fn new(mut cursors: Vec<SubCursor>) -> Self {
        debug_assert!(cursors.len() >= 2);
        // Advisory cost ordering: cheap cursors lead the scan. Correctness
        // never depends on this order.
        cursors.sort_by_key(|sub| sub.cursor.cost());
        let active = cursors
            .iter()
            .map(|sub| sub.cursor.doc())
            .min()
            .unwrap_or(TERMINATED);
        PriorityTraversal {
            cursors,
            active,
            target: None,
        }
    }

    /// Advance every cursor short of `target` and recompute the minimum
    fn merge_advance(&mut self, target: DocId) {
        let mut min = TERMINATED;
        for sub in &mut self.cursors {
            let mut doc = sub.cursor.doc();
            if doc < target {
                doc = sub.cursor.advance_to(target);
            }
            min = min.min(doc);
        }
        self.active = min;
    }

    fn advance_to(&mut self, target: DocId) -> DocId {
        if self.active < target {
            self.merge_advance(target);
        }
        self.target = Some(target);
        // The reported position is the caller's target, not the merge
        // position: the caller always receives the document it asked for.
        target
    }

    fn next_doc(&mut self) -> DocId {
        match self.target {
            None => self.advance_to(0),
            Some(target) => {
                if self.active == target {
                    // Step the merge past the document it sits on.
                    self.merge_advance(self.active + 1);
                } else if self.active < target {
                    self.merge_advance(target + 1);
                }
                self.target = Some(target + 1);
                target + 1
            }
        }
    }

    fn fill_matches(&mut self, vector: &mut FeatureVector) -> Result<()> {
        if self.target != Some(self.active) || self.active == TERMINATED {
            return Ok(());
        }
        // Tied set: exactly the cursors sitting on the minimum.
        let tied: SmallVec<[usize; 8]> = self
            .cursors
            .iter()
            .enumerate()
            .filter(|(_, sub)| sub.cursor.doc() == self.active)
            .map(|(i, _)| i)
            .collect();
        for i in tied {
            matched_value(&mut self.cursors[i], vector)?;
        }
        Ok(())
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Merge strategy over the extracted feature cursors
///
/// The strategy is selected once per segment execution from the cursor
/// count and never changes afterwards.
pub enum Traversal {
    /// Zero or one cursor
    Degenerate(DegenerateTraversal),
    /// Two or more cursors
    Priority(PriorityTraversal),
}

impl Traversal {
    /// Select a strategy for the given cursors
    pub fn new(mut cursors: Vec<SubCursor>) -> Self {
        if cursors.len() <= 1 {
            Traversal::Degenerate(DegenerateTraversal::new(cursors.pop()))
        } else {
            Traversal::Priority(PriorityTraversal::new(cursors))
        }
    }

    /// Document most recently requested, if any
    pub fn doc(&self) -> Option<DocId> {
        match self {
            Traversal::Degenerate(t) => t.target,
            Traversal::Priority(t) => t.target,
        }
    }

    /// Request a document; always returns the requested target
    pub fn advance_to(&mut self, target: DocId) -> DocId {
        match self {
            Traversal::Degenerate(t) => t.advance_to(target),
            Traversal::Priority(t) => t.advance_to(target),
        }
    }

    /// Request the document after the current target
    pub fn next_doc(&mut self) -> DocId {
        match self {
            Traversal::Degenerate(t) => match t.target {
                None => t.advance_to(0),
                Some(target) => t.advance_to(target + 1),
            },
            Traversal::Priority(t) => t.next_doc(),
        }
    }

    /// Populate the vector slots of the features matching the current target
    ///
    /// The vector must have been freshly reset. Cursors are not moved, so
    /// repeated calls at an unchanged position produce identical state.
    pub fn fill_matches(&mut self, vector: &mut FeatureVector) -> Result<()> {
        match self {
            Traversal::Degenerate(t) => t.fill_matches(vector),
            Traversal::Priority(t) => t.fill_matches(vector),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rescore_core::cursor::SortedDocsCursor;
    use rescore_features::{FeatureConfig, FeatureStore};

    fn vector(n: usize) -> FeatureVector {
        let configs: Vec<FeatureConfig> = (0..n)
            .map(|i| {
                serde_json::from_str(&format!(
                    r#"{{"name":"f{i}","class":"value","params":{{"value":{i}}}}}"#
                ))
                .unwrap()
            })
            .collect();
        let store = FeatureStore::compile("test", &configs).unwrap();
        FeatureVector::new(store.features())
    }

    fn sub(slot: usize, postings: Vec<(DocId, f32)>) -> SubCursor {
        SubCursor::new(slot, Box::new(SortedDocsCursor::new(postings)))
    }

    fn used(vector: &FeatureVector) -> Vec<bool> {
        vector.slots().iter().map(|s| s.used()).collect()
    }

    #[test]
    fn test_no_cursors_scores_every_document() {
        let mut t = Traversal::new(vec![]);
        let mut v = vector(0);
        for doc in [0, 3, 17] {
            assert_eq!(t.advance_to(doc), doc);
            v.reset();
            t.fill_matches(&mut v).unwrap();
        }
        assert_eq!(t.doc(), Some(17));
    }

    #[test]
    fn test_single_cursor_match_and_miss() {
        let mut t = Traversal::new(vec![sub(0, vec![(2, 5.0), (6, 7.0)])]);
        let mut v = vector(1);

        assert_eq!(t.advance_to(2), 2);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert!(v.slot(0).used());
        assert_eq!(v.slot(0).value(), 5.0);

        // Doc 4 has no match: requested position still reported, slot default.
        assert_eq!(t.advance_to(4), 4);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert!(!v.slot(0).used());

        assert_eq!(t.advance_to(6), 6);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(v.slot(0).value(), 7.0);
    }

    #[test]
    fn test_single_cursor_request_before_first_match() {
        let mut t = Traversal::new(vec![sub(0, vec![(5, 1.0)])]);
        let mut v = vector(1);

        // The cursor already sits at 5; requesting 3 must not move it.
        assert_eq!(t.advance_to(3), 3);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert!(!v.slot(0).used());

        assert_eq!(t.advance_to(5), 5);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert!(v.slot(0).used());
    }

    #[test]
    fn test_priority_tied_cursors_marked_used() {
        // Cursors positioned at {5, 7, 7}.
        let mut t = Traversal::new(vec![
            sub(0, vec![(5, 1.0), (11, 1.5)]),
            sub(1, vec![(7, 2.0)]),
            sub(2, vec![(7, 3.0)]),
        ]);
        let mut v = vector(3);

        // Requesting 6 scores from defaults and must not retreat cursors.
        assert_eq!(t.advance_to(6), 6);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [false, false, false]);

        // Requesting 7 marks exactly the two tied cursors used.
        assert_eq!(t.advance_to(7), 7);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [false, true, true]);
        assert_eq!(v.slot(1).value(), 2.0);
        assert_eq!(v.slot(2).value(), 3.0);
    }

    #[test]
    fn test_priority_merge_lags_reported_position() {
        let mut t = Traversal::new(vec![
            sub(0, vec![(10, 1.0)]),
            sub(1, vec![(20, 2.0)]),
        ]);
        let mut v = vector(2);

        // The merge minimum is 10; requests below it do no cursor work and
        // still report the requested doc.
        for doc in [1, 2, 3] {
            assert_eq!(t.advance_to(doc), doc);
            v.reset();
            t.fill_matches(&mut v).unwrap();
            assert_eq!(used(&v), [false, false]);
        }

        assert_eq!(t.advance_to(10), 10);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [true, false]);
    }

    #[test]
    fn test_priority_exhaustion_still_scores() {
        let mut t = Traversal::new(vec![
            sub(0, vec![(1, 1.0)]),
            sub(1, vec![(2, 2.0)]),
        ]);
        let mut v = vector(2);

        assert_eq!(t.advance_to(50), 50);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [false, false]);

        // Further requests keep reporting their target.
        assert_eq!(t.advance_to(60), 60);
    }

    #[test]
    fn test_fill_is_idempotent_at_fixed_position() {
        let mut t = Traversal::new(vec![
            sub(0, vec![(4, 1.0)]),
            sub(1, vec![(4, 2.0)]),
        ]);
        let mut v = vector(2);

        t.advance_to(4);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        let first: Vec<(f32, bool)> = v.slots().iter().map(|s| (s.value(), s.used())).collect();

        v.reset();
        t.fill_matches(&mut v).unwrap();
        let second: Vec<(f32, bool)> = v.slots().iter().map(|s| (s.value(), s.used())).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_next_doc_visits_consecutive_documents() {
        let mut t = Traversal::new(vec![
            sub(0, vec![(0, 1.0), (2, 1.0)]),
            sub(1, vec![(2, 2.0)]),
        ]);
        let mut v = vector(2);

        assert_eq!(t.next_doc(), 0);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [true, false]);

        assert_eq!(t.next_doc(), 1);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [false, false]);

        assert_eq!(t.next_doc(), 2);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert_eq!(used(&v), [true, true]);
    }

    #[test]
    fn test_evaluator_failure_carries_feature_name() {
        struct FailingCursor;

        impl rescore_core::cursor::FeatureCursor for FailingCursor {
            fn doc(&self) -> DocId {
                0
            }
            fn advance_to(&mut self, _target: DocId) -> DocId {
                0
            }
            fn value(&mut self) -> Result<f32> {
                Err(Error::evaluation("", "unsupported operation"))
            }
            fn cost(&self) -> u64 {
                1
            }
        }

        let mut t = Traversal::new(vec![SubCursor::new(0, Box::new(FailingCursor))]);
        let mut v = vector(1);

        t.advance_to(0);
        v.reset();
        let err = t.fill_matches(&mut v).unwrap_err();
        match err {
            Error::Evaluation { feature, message } => {
                assert_eq!(feature, "f0");
                assert!(message.contains("unsupported operation"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_next_doc() {
        let mut t = Traversal::new(vec![sub(0, vec![(1, 9.0)])]);
        let mut v = vector(1);

        assert_eq!(t.next_doc(), 0);
        assert_eq!(t.next_doc(), 1);
        v.reset();
        t.fill_matches(&mut v).unwrap();
        assert!(v.slot(0).used());
        assert_eq!(t.next_doc(), 2);
    }
}
