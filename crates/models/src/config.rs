//! Model and normalizer configuration shapes
//!
//! This module provides:
//! - ModelConfig: the `{ name, class, features, params }` definition shape
//! - ModelFeatureConfig: one model feature with an optional normalizer
//! - NormalizerConfig: the `{ class, params }` normalizer shape
//! - TreeConfig / TreeNodeConfig: regression tree definitions
//!
//! Numeric normalizer parameters accept both JSON numbers and numeric
//! strings, matching the way definitions are commonly exported from
//! training pipelines.

use crate::norm::Normalizer;
use rescore_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Numeric parameters
// ============================================================================

/// A numeric parameter that may arrive as a number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumOrStr {
    /// Plain JSON number
    Num(f32),
    /// Numeric string such as `"100"`
    Str(String),
}

impl NumOrStr {
    fn as_f32(&self, context: &str) -> Result<f32> {
        match self {
            NumOrStr::Num(n) => Ok(*n),
            NumOrStr::Str(s) => s
                .parse::<f32>()
                .map_err(|_| Error::Normalizer(format!("{context}: invalid number {s:?}"))),
        }
    }
}

// ============================================================================
// NormalizerConfig
// ============================================================================

/// One normalizer definition as supplied by the configuration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Normalizer class: `identity`, `standard` or `min_max`
    pub class: String,
    /// Class-specific parameters
    #[serde(default)]
    pub params: NormalizerParams,
}

/// Parameters of a normalizer definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizerParams {
    /// Distribution average (`standard`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<NumOrStr>,
    /// Distribution standard deviation (`standard`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<NumOrStr>,
    /// Lower bound (`min_max`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<NumOrStr>,
    /// Upper bound (`min_max`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<NumOrStr>,
}

impl NormalizerConfig {
    /// Compile the definition, validating its parameters
    pub fn compile(&self) -> Result<Normalizer> {
        match self.class.as_str() {
            "identity" => Ok(Normalizer::Identity),
            "standard" => {
                let avg = self.param_or(&self.params.avg, "avg", 0.0)?;
                let std = self.param_or(&self.params.std, "std", 1.0)?;
                Normalizer::standard(avg, std)
            }
            "min_max" => {
                let min = self.param_or(&self.params.min, "min", f32::NEG_INFINITY)?;
                let max = self.param_or(&self.params.max, "max", f32::INFINITY)?;
                Normalizer::min_max(min, max)
            }
            other => Err(Error::Normalizer(format!(
                "normalizer class does not exist: {other}"
            ))),
        }
    }

    fn param_or(&self, value: &Option<NumOrStr>, name: &str, default: f32) -> Result<f32> {
        match value {
            Some(v) => v.as_f32(&format!("normalizer {} param {name}", self.class)),
            None => Ok(default),
        }
    }
}

// ============================================================================
// ModelConfig
// ============================================================================

/// One model definition as supplied by the configuration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name
    pub name: String,
    /// Model class: `linear` or `additive_trees`
    pub class: String,
    /// Feature store the model's features live in; the default store when
    /// omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// Ordered model features
    #[serde(default)]
    pub features: Vec<ModelFeatureConfig>,
    /// Class-specific parameters
    #[serde(default)]
    pub params: ModelParams,
}

/// One feature reference inside a model definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFeatureConfig {
    /// Feature name, resolved against the model's store
    pub name: String,
    /// Optional normalizer; identity when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<NormalizerConfig>,
}

/// Class-specific model parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Feature name → weight map (`linear`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f32>,
    /// Regression trees (`additive_trees`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trees: Vec<TreeConfig>,
}

/// One weighted regression tree definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Contribution weight; required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    /// Root node; required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<TreeNodeConfig>,
}

/// One regression tree node definition
///
/// A node with a `feature` is a split; a node without one is a leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNodeConfig {
    /// Leaf value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    /// Split feature name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Split threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    /// Branch taken when the value is at or below the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<TreeNodeConfig>>,
    /// Branch taken otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<TreeNodeConfig>>,
}

// ============================================================================
// Tests
// ============================================================================
