//! Feature definitions and stores for rescore
//!
//! This crate provides:
//! - Feature: a named, indexed recipe for deriving one value per document
//! - FeatureKind: the closed set of feature capabilities
//! - FeatureConfig: the serde shape features are defined with
//! - FeatureStore: named feature collection with stable index assignment
//! - SegmentSource: the contract the host query engine implements per segment
//! - InMemorySegment: a self-contained SegmentSource for tests and embedding

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod feature;
pub mod segment;
pub mod store;

pub use config::{FeatureConfig, FeatureParams};
pub use feature::{Feature, FeatureKind};
pub use segment::{InMemorySegment, SegmentSource};
pub use store::FeatureStore;
