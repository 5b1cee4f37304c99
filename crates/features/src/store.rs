//! Named feature stores
//!
//! This module provides:
//! - FeatureStore: ordered name → feature mapping with stable indices
//!
//! Stores are created and updated by the configuration layer and are
//! strictly read-only to the scoring engine. Indices are assigned densely
//! in insertion order; redefining a feature keeps its index so that models
//! compiled against the store stay positionally valid.

use crate::config::FeatureConfig;
use crate::feature::Feature;
use rescore_core::{Error, Result};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Name of the store used when a definition does not specify one
pub const DEFAULT_STORE: &str = "_default_";

// ============================================================================
// FeatureStore
// ============================================================================

/// Named mapping from feature name to feature definition
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    name: String,
    features: Vec<Arc<Feature>>,
    by_name: FxHashMap<String, usize>,
}

impl FeatureStore {
    /// Create an empty store
    pub fn new(name: impl Into<String>) -> Self {
        FeatureStore {
            name: name.into(),
            features: vec![],
            by_name: FxHashMap::default(),
        }
    }

    /// Compile a store from an ordered list of definitions
    pub fn compile(name: impl Into<String>, configs: &[FeatureConfig]) -> Result<Self> {
        let mut store = FeatureStore::new(name);
        for config in configs {
            store.define(config)?;
        }
        Ok(store)
    }

    /// Store name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define or redefine a feature
    ///
    /// New names are assigned the next dense index; an existing name keeps
    /// its index and has its definition replaced.
    pub fn define(&mut self, config: &FeatureConfig) -> Result<Arc<Feature>> {
        if config.name.is_empty() {
            return Err(Error::Feature("feature name must not be empty".to_string()));
        }
        let kind = config.compile_kind()?;
        let index = match self.by_name.get(&config.name) {
            Some(&index) => index,
            None => {
                let index = self.features.len();
                self.by_name.insert(config.name.clone(), index);
                self.features.push(Arc::new(Feature::new(
                    config.name.clone(),
                    index,
                    config.params.default_value,
                    kind.clone(),
                )));
                tracing::info!(store = %self.name, feature = %config.name, index, "defined feature");
                return Ok(Arc::clone(&self.features[index]));
            }
        };
        let feature = Arc::new(Feature::new(
            config.name.clone(),
            index,
            config.params.default_value,
            kind,
        ));
        self.features[index] = Arc::clone(&feature);
        tracing::info!(store = %self.name, feature = %config.name, index, "redefined feature");
        Ok(feature)
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<&Arc<Feature>> {
        self.by_name.get(name).map(|&i| &self.features[i])
    }

    /// All features in index order
    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    /// Number of features in the store
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the store holds no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
