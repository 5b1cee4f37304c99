//! Scoring models and normalizers for rescore
//!
//! This crate provides:
//! - Normalizer: identity, standard and min/max value normalization
//! - ScoringModel: a named model over (feature, normalizer) pairs
//! - LinearModel: dot-product scoring (RankSVM, Pranking)
//! - AdditiveTreesModel: weighted regression-tree ensembles (LambdaMART, GBRT)
//! - ModelConfig: the serde shape models are defined with
//!
//! Weights and trees are supplied pre-trained; all structural validation
//! happens once at model construction and is never deferred to scoring.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod linear;
pub mod model;
pub mod norm;
pub mod trees;

pub use config::{ModelConfig, ModelFeatureConfig, NormalizerConfig};
pub use linear::LinearModel;
pub use model::{ModelKind, ScoringModel};
pub use norm::Normalizer;
pub use trees::{AdditiveTreesModel, RegressionTree, TreeNode};
