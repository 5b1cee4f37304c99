//! Segment-local document identifiers
//!
//! This module provides:
//! - DocId type alias used for all cursor positioning
//! - TERMINATED sentinel marking an exhausted cursor

/// Segment-local document identifier.
///
/// Candidate documents are presented to the engine in increasing DocId
/// order within one query segment. Ids are dense, starting at 0.
pub type DocId = u32;

/// Sentinel for a cursor that has run out of documents.
///
/// A cursor positioned at `TERMINATED` never reports another document.
/// Real document ids are always strictly smaller.
pub const TERMINATED: DocId = DocId::MAX;
