//! Feature store and model registry
//!
//! This module provides:
//! - Registry: named feature stores plus compiled models behind a lock
//!
//! The registry is the write side of the configuration layer: definitions
//! go in as JSON-shaped configs, compile and validate immediately, and a
//! failed update leaves the prior state intact. The read side hands out
//! `Arc`s to immutable compiled definitions, which scoring contexts on any
//! number of threads share freely.

use parking_lot::RwLock;
use rescore_core::{Error, Result};
use rescore_features::store::DEFAULT_STORE;
use rescore_features::{FeatureConfig, FeatureStore};
use rescore_models::{ModelConfig, ScoringModel};
use rustc_hash::FxHashMap;
use std::sync::Arc;

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Default)]
struct RegistryState {
    /// Store name -> (definitions in index order, compiled store)
    stores: FxHashMap<String, StoreEntry>,
    models: FxHashMap<String, Arc<ScoringModel>>,
}

#[derive(Debug)]
struct StoreEntry {
    configs: Vec<FeatureConfig>,
    compiled: Arc<FeatureStore>,
}

/// Named feature stores and compiled scoring models
///
/// # Thread Safety
///
/// All methods take `&self`; the registry is safe to share behind an
/// `Arc` across threads. Updates hold the write lock only for the swap.
#[derive(Debug, Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Registry::default()
    }

    // ========================================================================
    // Features
    // ========================================================================

    /// Define or redefine features in a store
    ///
    /// The store is created on first use. Existing names are replaced in
    /// place (keeping their index), new names are appended. On any
    /// compile failure the store is left exactly as it was.
    pub fn put_features(&self, store_name: &str, configs: &[FeatureConfig]) -> Result<()> {
        let mut state = self.state.write();
        let mut merged = state
            .stores
            .get(store_name)
            .map(|entry| entry.configs.clone())
            .unwrap_or_default();

        for config in configs {
            match merged.iter_mut().find(|c| c.name == config.name) {
                Some(existing) => *existing = config.clone(),
                None => merged.push(config.clone()),
            }
        }

        let compiled = Arc::new(FeatureStore::compile(store_name, &merged)?);
        tracing::info!(store = store_name, features = compiled.len(), "updated feature store");
        state.stores.insert(
            store_name.to_string(),
            StoreEntry {
                configs: merged,
                compiled,
            },
        );
        Ok(())
    }

    /// Remove features from a store
    ///
    /// Remaining features are re-indexed densely. Models compiled earlier
    /// keep their own immutable feature snapshots and are unaffected.
    pub fn delete_features(&self, store_name: &str, names: &[&str]) -> Result<()> {
        let mut state = self.state.write();
        let entry = state.stores.get(store_name).ok_or_else(|| {
            Error::Feature(format!("unknown feature store: {store_name}"))
        })?;

        let remaining: Vec<FeatureConfig> = entry
            .configs
            .iter()
            .filter(|c| !names.contains(&c.name.as_str()))
            .cloned()
            .collect();
        let compiled = Arc::new(FeatureStore::compile(store_name, &remaining)?);
        tracing::info!(store = store_name, removed = names.len(), "removed features");
        state.stores.insert(
            store_name.to_string(),
            StoreEntry {
                configs: remaining,
                compiled,
            },
        );
        Ok(())
    }

    /// Look up a compiled feature store
    pub fn get_store(&self, store_name: &str) -> Option<Arc<FeatureStore>> {
        self.state
            .read()
            .stores
            .get(store_name)
            .map(|entry| Arc::clone(&entry.compiled))
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// Compile and register a model against its feature store
    ///
    /// The store is `config.store`, or the default store when omitted.
    /// Compile failures reject the update; an existing model of the same
    /// name stays registered.
    pub fn put_model(&self, config: &ModelConfig) -> Result<Arc<ScoringModel>> {
        let store_name = config.store.as_deref().unwrap_or(DEFAULT_STORE);
        let mut state = self.state.write();
        let store = state.stores.get(store_name).ok_or_else(|| {
            Error::Model(format!(
                "model {}: unknown feature store {store_name}",
                config.name
            ))
        })?;

        let model = Arc::new(ScoringModel::compile(config, &store.compiled)?);
        state
            .models
            .insert(config.name.clone(), Arc::clone(&model));
        Ok(model)
    }

    /// Remove a model; returns whether it existed
    pub fn delete_model(&self, name: &str) -> bool {
        self.state.write().models.remove(name).is_some()
    }

    /// Look up a compiled model
    pub fn get_model(&self, name: &str) -> Option<Arc<ScoringModel>> {
        self.state.read().models.get(name).map(Arc::clone)
    }

    /// Names of all registered models
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().models.keys().cloned().collect();
        names.sort();
        names
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_configs(json: &str) -> Vec<FeatureConfig> {
        serde_json::from_str(json).unwrap()
    }

    fn model_config(json: &str) -> ModelConfig {
        serde_json::from_str(json).unwrap()
    }

    fn seeded() -> Registry {
        let registry = Registry::new();
        registry
            .put_features(
                DEFAULT_STORE,
                &feature_configs(
                    r#"[
                        {"name":"a","class":"value","params":{"value":1}},
                        {"name":"b","class":"value","params":{"value":2}}
                    ]"#,
                ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_put_features_creates_store() {
        let registry = seeded();
        let store = registry.get_store(DEFAULT_STORE).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b").unwrap().index(), 1);
    }

    #[test]
    fn test_put_features_merges_and_keeps_indices() {
        let registry = seeded();
        registry
            .put_features(
                DEFAULT_STORE,
                &feature_configs(
                    r#"[
                        {"name":"a","class":"value","params":{"value":9}},
                        {"name":"c","class":"value","params":{"value":3}}
                    ]"#,
                ),
            )
            .unwrap();

        let store = registry.get_store(DEFAULT_STORE).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("a").unwrap().index(), 0);
        assert_eq!(store.get("c").unwrap().index(), 2);
    }

    #[test]
    fn test_invalid_update_leaves_store_intact() {
        let registry = seeded();
        let err = registry.put_features(
            DEFAULT_STORE,
            &feature_configs(r#"[{"name":"bad","class":"neural"}]"#),
        );
        assert!(err.is_err());

        let store = registry.get_store(DEFAULT_STORE).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("bad").is_none());
    }

    #[test]
    fn test_delete_features_reindexes() {
        let registry = seeded();
        registry.delete_features(DEFAULT_STORE, &["a"]).unwrap();

        let store = registry.get_store(DEFAULT_STORE).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b").unwrap().index(), 0);
    }

    #[test]
    fn test_put_model_and_lookup() {
        let registry = seeded();
        let model = registry
            .put_model(&model_config(
                r#"{"name":"m","class":"linear",
                    "features":[{"name":"a"},{"name":"b"}],
                    "params":{"weights":{"a":1.0,"b":1.0}}}"#,
            ))
            .unwrap();
        assert_eq!(model.name(), "m");
        assert!(registry.get_model("m").is_some());
        assert_eq!(registry.model_names(), ["m"]);
    }

    #[test]
    fn test_put_model_unknown_store() {
        let registry = seeded();
        let err = registry
            .put_model(&model_config(
                r#"{"name":"m","class":"linear","store":"ghost",
                    "features":[{"name":"a"}],
                    "params":{"weights":{"a":1.0}}}"#,
            ))
            .unwrap_err();
        assert!(err.to_string().contains("unknown feature store"));
    }

    #[test]
    fn test_invalid_model_keeps_previous_version() {
        let registry = seeded();
        registry
            .put_model(&model_config(
                r#"{"name":"m","class":"linear",
                    "features":[{"name":"a"}],
                    "params":{"weights":{"a":1.0}}}"#,
            ))
            .unwrap();

        let err = registry.put_model(&model_config(
            r#"{"name":"m","class":"linear",
                "features":[{"name":"a"}],
                "params":{}}"#,
        ));
        assert!(err.is_err());

        // The earlier, valid model is still served.
        let model = registry.get_model("m").unwrap();
        assert_eq!(model.score(&[2.0]), 2.0);
    }

    #[test]
    fn test_delete_model() {
        let registry = seeded();
        registry
            .put_model(&model_config(
                r#"{"name":"m","class":"linear",
                    "features":[{"name":"a"}],
                    "params":{"weights":{"a":1.0}}}"#,
            ))
            .unwrap();
        assert!(registry.delete_model("m"));
        assert!(!registry.delete_model("m"));
        assert!(registry.get_model("m").is_none());
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }

    #[test]
    fn test_models_snapshot_survives_feature_delete() {
        let registry = seeded();
        let model = registry
            .put_model(&model_config(
                r#"{"name":"m","class":"linear",
                    "features":[{"name":"a"},{"name":"b"}],
                    "params":{"weights":{"a":1.0,"b":1.0}}}"#,
            ))
            .unwrap();

        registry.delete_features(DEFAULT_STORE, &["a"]).unwrap();
        // The compiled model still scores with its own feature snapshot.
        assert_eq!(model.score(&[2.0, 3.0]), 5.0);
    }
}
