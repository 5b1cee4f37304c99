//! rescore - learning-to-rank rescoring engine
//!
//! rescore reranks a bounded candidate set from a first-pass search by
//! assembling a per-document feature vector and evaluating a pre-trained
//! scoring model (linear or additive regression trees) over it.
//!
//! # Quick Start
//!
//! ```
//! use rescore::{Registry, ScoringContext, InMemorySegment};
//!
//! # fn main() -> rescore::Result<()> {
//! let registry = Registry::new();
//! let features: Vec<rescore::FeatureConfig> = serde_json::from_str(
//!     r#"[{"name":"titleLength","class":"field_length","params":{"field":"title"}}]"#,
//! ).unwrap();
//! registry.put_features("_default_", &features)?;
//! let model = registry.put_model(&serde_json::from_str(
//!     r#"{"name":"demo","class":"linear",
//!         "features":[{"name":"titleLength"}],
//!         "params":{"weights":{"titleLength":2.0}}}"#,
//! ).unwrap())?;
//!
//! let segment = InMemorySegment::new(8).with_field_lengths("title", vec![(3, 4.0)]);
//! let mut scorer = ScoringContext::new(model).bind(&segment)?;
//! scorer.advance_to(3);
//! assert_eq!(scorer.score()?, 8.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! Feature definitions live in named [`FeatureStore`]s and models compile
//! against them once, up front; scoring never revalidates. Per segment,
//! a [`ScoringContext`] binds one cursor per extracted feature and a merge
//! engine decides, document by document, which features actually matched.
//! Every requested document receives a score, matched or not.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;

pub use registry::Registry;

// Re-export the public API of the member crates
pub use rescore_core::{
    DocId, Error, Explanation, ExternalParams, ParamValue, Result, TERMINATED,
};
pub use rescore_core::cursor::{EmptyCursor, FeatureCursor, MatchAllCursor, SortedDocsCursor};
pub use rescore_engine::{
    FeatureLogger, FeatureSlot, FeatureVector, RecordFormat, RecordMode, RescoreKey,
    ScoringContext, SegmentScorer, SubCursor, Traversal,
};
pub use rescore_features::{
    Feature, FeatureConfig, FeatureKind, FeatureStore, InMemorySegment, SegmentSource,
};
pub use rescore_features::store::DEFAULT_STORE;
pub use rescore_models::{
    AdditiveTreesModel, LinearModel, ModelConfig, ModelKind, Normalizer, NormalizerConfig,
    RegressionTree, ScoringModel, TreeNode,
};
