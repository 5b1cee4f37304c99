//! Dot-product scoring
//!
//! This module provides:
//! - LinearModel: one weight per model feature, score = Σ value * weight
//!
//! Example models are RankSVM and Pranking. Weights are resolved by feature
//! name at construction; a model that lacks a weight for any of its
//! features is rejected outright.
//!
//! Example definition:
//!
//! ```json
//! {
//!   "name": "myModelName",
//!   "class": "linear",
//!   "features": [
//!     { "name": "userTextTitleMatch" },
//!     { "name": "originalScore" }
//!   ],
//!   "params": {
//!     "weights": { "userTextTitleMatch": 1.0, "originalScore": 0.5 }
//!   }
//! }
//! ```

use rescore_core::{Error, Explanation, Result};
use rescore_features::Feature;
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// LinearModel
// ============================================================================

/// Weighted sum over normalized feature values
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<f32>,
}

impl LinearModel {
    /// Resolve one weight per model feature from a name → weight map
    ///
    /// All features missing a weight is reported as a model without
    /// weights; a partial weight map is reported with the names of the
    /// features it misses.
    pub fn from_weights(
        model_name: &str,
        features: &[Arc<Feature>],
        weights: &BTreeMap<String, f32>,
    ) -> Result<Self> {
        let mut resolved = Vec::with_capacity(features.len());
        let mut missing = Vec::new();
        for feature in features {
            match weights.get(feature.name()) {
                Some(&w) => resolved.push(w),
                None => missing.push(feature.name().to_string()),
            }
        }
        if missing.len() == features.len() {
            return Err(Error::Model(format!(
                "model {model_name} doesn't contain any weights"
            )));
        }
        if !missing.is_empty() {
            return Err(Error::Model(format!(
                "model {model_name} lacks weight(s) for {missing:?}"
            )));
        }
        Ok(LinearModel { weights: resolved })
    }

    /// Per-feature weights in model feature order
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Dot product of the normalized vector and the weights
    pub fn score(&self, normalized: &[f32]) -> f32 {
        normalized
            .iter()
            .zip(&self.weights)
            .map(|(v, w)| v * w)
            .sum()
    }

    /// Per-feature weight products summed into the final score
    pub fn explain(&self, final_score: f32, feature_explanations: &[Explanation]) -> Explanation {
        let details = feature_explanations
            .iter()
            .zip(&self.weights)
            .map(|(feature_explain, &weight)| {
                Explanation::with_details(
                    feature_explain.value() * weight,
                    "prod of:",
                    vec![
                        Explanation::leaf(weight, "weight on feature"),
                        feature_explain.clone(),
                    ],
                )
            })
            .collect();
        Explanation::with_details(
            final_score,
            "linear model applied to features, sum of:",
            details,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
