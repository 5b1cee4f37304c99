//! Feature merge and model execution for rescore
//!
//! This crate provides:
//! - FeatureVector: per-document (value, used) bookkeeping with defaults
//! - Traversal: the cursor merge engine (degenerate and priority strategies)
//! - ScoringContext / SegmentScorer: per-segment model execution
//! - FeatureLogger: csv/json, dense/sparse feature-vector records
//!
//! The merge engine decouples the document requested by the caller from the
//! document the underlying cursors have reached, so that every candidate
//! document receives a score even when no feature matches it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logger;
pub mod scorer;
pub mod traversal;
pub mod vector;

pub use logger::{FeatureLogger, RecordFormat, RecordMode};
pub use scorer::{RescoreKey, ScoringContext, SegmentScorer};
pub use traversal::{SubCursor, Traversal};
pub use vector::{FeatureSlot, FeatureVector};
