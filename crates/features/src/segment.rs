//! Segment contract between the host query engine and the feature layer
//!
//! This module provides:
//! - SegmentSource: the trait the host implements once per query segment
//! - InMemorySegment: a self-contained implementation for tests and embedding
//!
//! Cursors handed out by a SegmentSource may perform I/O internally; that is
//! the host's concern. The scoring engine itself never blocks.

use rescore_core::cursor::{FeatureCursor, SortedDocsCursor};
use rescore_core::{DocId, Result};
use rustc_hash::FxHashMap;

// ============================================================================
// SegmentSource
// ============================================================================

/// Per-segment cursor factory implemented by the host query engine
///
/// Each method builds a fresh cursor positioned on its first match.
/// `Ok(None)` means the feature has no match anywhere in this segment and
/// will fall back to its default value for every document; `Err` is a
/// binding failure that aborts the segment evaluation.
pub trait SegmentSource {
    /// Number of documents in this segment (ids are `0..max_doc`)
    fn max_doc(&self) -> DocId;

    /// Cursor over the per-document length (in terms) of `field`
    fn field_length_cursor(&self, field: &str) -> Result<Option<Box<dyn FeatureCursor>>>;

    /// Cursor over the numeric value of a stored (`from_source == false`)
    /// or source (`from_source == true`) field
    fn field_value_cursor(
        &self,
        field: &str,
        from_source: bool,
    ) -> Result<Option<Box<dyn FeatureCursor>>>;

    /// Cursor over the scores of a host-parsed sub-query
    ///
    /// The query string arrives with all `${param}` placeholders already
    /// substituted.
    fn query_cursor(&self, query: &str) -> Result<Option<Box<dyn FeatureCursor>>>;
}

// ============================================================================
// InMemorySegment
// ============================================================================

/// Self-contained segment backed by in-memory posting lists
///
/// Hosts embed real index readers behind [`SegmentSource`]; this
/// implementation serves tests, benchmarks and small standalone setups.
/// Field and query postings are registered up front as sorted
/// (document, value) lists.
#[derive(Debug, Clone, Default)]
pub struct InMemorySegment {
    max_doc: DocId,
    field_lengths: FxHashMap<String, Vec<(DocId, f32)>>,
    field_values: FxHashMap<String, Vec<(DocId, f32)>>,
    queries: FxHashMap<String, Vec<(DocId, f32)>>,
}

impl InMemorySegment {
    /// Create a segment with documents `0..max_doc`
    pub fn new(max_doc: DocId) -> Self {
        InMemorySegment {
            max_doc,
            ..InMemorySegment::default()
        }
    }

    /// Builder: register per-document lengths for a field
    pub fn with_field_lengths(mut self, field: impl Into<String>, postings: Vec<(DocId, f32)>) -> Self {
        self.field_lengths.insert(field.into(), postings);
        self
    }

    /// Builder: register per-document numeric values for a field
    pub fn with_field_values(mut self, field: impl Into<String>, postings: Vec<(DocId, f32)>) -> Self {
        self.field_values.insert(field.into(), postings);
        self
    }

    /// Builder: register the match set of a query string
    pub fn with_query(mut self, query: impl Into<String>, postings: Vec<(DocId, f32)>) -> Self {
        self.queries.insert(query.into(), postings);
        self
    }

    fn cursor_over(postings: Option<&Vec<(DocId, f32)>>) -> Option<Box<dyn FeatureCursor>> {
        postings.map(|p| Box::new(SortedDocsCursor::new(p.clone())) as Box<dyn FeatureCursor>)
    }
}

impl SegmentSource for InMemorySegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn field_length_cursor(&self, field: &str) -> Result<Option<Box<dyn FeatureCursor>>> {
        Ok(Self::cursor_over(self.field_lengths.get(field)))
    }

    fn field_value_cursor(
        &self,
        field: &str,
        _from_source: bool,
    ) -> Result<Option<Box<dyn FeatureCursor>>> {
        Ok(Self::cursor_over(self.field_values.get(field)))
    }

    fn query_cursor(&self, query: &str) -> Result<Option<Box<dyn FeatureCursor>>> {
        Ok(Self::cursor_over(self.queries.get(query)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_segment_field_lengths() {
        let segment =
            InMemorySegment::new(10).with_field_lengths("title", vec![(0, 3.0), (4, 7.0)]);

        let mut cursor = segment.field_length_cursor("title").unwrap().unwrap();
        assert_eq!(cursor.doc(), 0);
        assert_eq!(cursor.value().unwrap(), 3.0);
        assert_eq!(cursor.advance_to(1), 4);
        assert_eq!(cursor.value().unwrap(), 7.0);
    }

    #[test]
    fn test_in_memory_segment_unknown_field() {
        let segment = InMemorySegment::new(10);
        assert!(segment.field_length_cursor("missing").unwrap().is_none());
        assert!(segment.field_value_cursor("missing", false).unwrap().is_none());
    }

    #[test]
    fn test_in_memory_segment_query() {
        let segment = InMemorySegment::new(10)
            .with_query(r#"{"term":{"category":"person"}}"#, vec![(2, 1.5)]);

        let cursor = segment
            .query_cursor(r#"{"term":{"category":"person"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(cursor.doc(), 2);
        assert!(segment.query_cursor("unregistered").unwrap().is_none());
    }
}
