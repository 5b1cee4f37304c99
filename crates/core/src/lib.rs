//! Core types and traits for rescore
//!
//! This crate defines the foundational types used throughout the system:
//! - DocId: Segment-local document identifier with a TERMINATED sentinel
//! - FeatureCursor: The per-feature document iteration contract
//! - ExternalParams: Per-request key/value inputs available to features
//! - Explanation: Tree-shaped score explanations
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod cursor;
pub mod docid;
pub mod error;
pub mod explain;
pub mod params;

// Re-export commonly used types and traits
pub use cursor::{EmptyCursor, FeatureCursor, MatchAllCursor, SortedDocsCursor};
pub use docid::{DocId, TERMINATED};
pub use error::{Error, Result};
pub use explain::Explanation;
pub use params::{ExternalParams, ParamValue};
