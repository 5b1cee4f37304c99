//! Scoring model assembly and evaluation
//!
//! This module provides:
//! - ScoringModel: name, (feature, normalizer) pairs and a model kind
//! - ModelKind: the closed set of scoring algorithms
//!
//! A scoring model consists of an ordered list of features, a same-length
//! list of normalizers and the algorithm parameters. Structural problems
//! (empty feature list, duplicate names, count mismatches, bad weights or
//! trees) are caught here, once, at construction.

use crate::config::ModelConfig;
use crate::linear::LinearModel;
use crate::norm::Normalizer;
use crate::trees::AdditiveTreesModel;
use rescore_core::{Error, Explanation, Result};
use rescore_features::{Feature, FeatureStore};
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// ModelKind
// ============================================================================

/// Scoring algorithm of a model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    /// Dot-product scoring
    Linear(LinearModel),
    /// Weighted regression-tree ensemble
    AdditiveTrees(AdditiveTreesModel),
}

// ============================================================================
// ScoringModel
// ============================================================================

/// A named function from a normalized feature vector to a final score
///
/// Immutable after construction and shared across concurrently running
/// scoring contexts behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringModel {
    name: String,
    store_name: String,
    features: Vec<Arc<Feature>>,
    norms: Vec<Normalizer>,
    all_features: Vec<Arc<Feature>>,
    kind: ModelKind,
}

impl ScoringModel {
    /// Assemble a model from already-resolved parts
    ///
    /// Validates the feature/normalizer lists; fails with
    /// [`Error::Model`] on an empty feature list, duplicate feature names
    /// or a feature/normalizer count mismatch.
    pub fn new(
        name: impl Into<String>,
        store_name: impl Into<String>,
        features: Vec<Arc<Feature>>,
        norms: Vec<Normalizer>,
        all_features: Vec<Arc<Feature>>,
        kind: ModelKind,
    ) -> Result<Self> {
        let model = ScoringModel {
            name: name.into(),
            store_name: store_name.into(),
            features,
            norms,
            all_features,
            kind,
        };
        model.validate()?;
        Ok(model)
    }

    /// Compile a model definition against its feature store
    pub fn compile(config: &ModelConfig, store: &FeatureStore) -> Result<Self> {
        let mut features = Vec::with_capacity(config.features.len());
        let mut norms = Vec::with_capacity(config.features.len());
        for feature_config in &config.features {
            let feature = store.get(&feature_config.name).ok_or_else(|| {
                Error::Model(format!(
                    "model {}: unknown feature {} in store {}",
                    config.name,
                    feature_config.name,
                    store.name()
                ))
            })?;
            features.push(Arc::clone(feature));
            norms.push(match &feature_config.norm {
                Some(norm_config) => norm_config.compile()?,
                None => Normalizer::Identity,
            });
        }

        let kind = match config.class.as_str() {
            "linear" => ModelKind::Linear(LinearModel::from_weights(
                &config.name,
                &features,
                &config.params.weights,
            )?),
            "additive_trees" => {
                let names: Vec<&str> = features.iter().map(|f| f.name()).collect();
                ModelKind::AdditiveTrees(AdditiveTreesModel::from_trees(
                    &config.name,
                    &names,
                    &config.params.trees,
                )?)
            }
            other => {
                return Err(Error::Model(format!(
                    "model class does not exist: {other}"
                )))
            }
        };

        let model = ScoringModel::new(
            config.name.clone(),
            store.name(),
            features,
            norms,
            store.features().to_vec(),
            kind,
        )?;
        tracing::info!(model = %model.name, store = %model.store_name, "compiled scoring model");
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(Error::Model(format!(
                "no features declared for model {}",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.name()) {
                return Err(Error::Model(format!(
                    "duplicated feature {} in model {}",
                    feature.name(),
                    self.name
                )));
            }
        }
        if self.features.len() != self.norms.len() {
            return Err(Error::Model(format!(
                "counted {} features and {} norms in model {}",
                self.features.len(),
                self.norms.len(),
                self.name
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the feature store backing this model
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Ordered model features (the scoring subset)
    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    /// Normalizers, one per model feature
    pub fn norms(&self) -> &[Normalizer] {
        &self.norms
    }

    /// Every feature of the backing store (the extraction superset)
    pub fn all_features(&self) -> &[Arc<Feature>] {
        &self.all_features
    }

    /// Scoring algorithm
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Normalize a model-ordered value buffer in place
    pub fn normalize_in_place(&self, values: &mut [f32]) {
        debug_assert_eq!(values.len(), self.norms.len());
        for (value, norm) in values.iter_mut().zip(&self.norms) {
            *value = norm.normalize(*value);
        }
    }

    /// Final score for a normalized, model-ordered value buffer
    pub fn score(&self, normalized: &[f32]) -> f32 {
        match &self.kind {
            ModelKind::Linear(linear) => linear.score(normalized),
            ModelKind::AdditiveTrees(trees) => trees.score(normalized),
        }
    }

    /// Wrap a feature explanation with the normalizer at a model position
    pub fn normalizer_explanation(&self, index: usize, inner: Explanation) -> Explanation {
        self.norms[index].explain(inner)
    }

    /// Compose per-feature explanations into a model-level explanation
    pub fn explain(&self, final_score: f32, feature_explanations: &[Explanation]) -> Explanation {
        match &self.kind {
            ModelKind::Linear(linear) => linear.explain(final_score, feature_explanations),
            ModelKind::AdditiveTrees(trees) => trees.explain(final_score, feature_explanations),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
