//! Per-document feature vector state
//!
//! This module provides:
//! - FeatureSlot: one feature's (value, used) pair for the current document
//! - FeatureVector: the slot arena reused across documents
//!
//! The vector is owned by one segment execution and reset before every
//! score computation: each slot returns to its feature's default value with
//! the used flag cleared, and the merge engine then overwrites exactly the
//! slots whose features matched the document. Reusing the arena avoids
//! per-document allocation.

use rescore_features::Feature;
use std::sync::Arc;

// ============================================================================
// FeatureSlot
// ============================================================================

/// One feature's bookkeeping for the document being scored
#[derive(Debug, Clone)]
pub struct FeatureSlot {
    feature: Arc<Feature>,
    value: f32,
    used: bool,
}

impl FeatureSlot {
    fn new(feature: Arc<Feature>) -> Self {
        let value = feature.default_value();
        FeatureSlot {
            feature,
            value,
            used: false,
        }
    }

    /// Feature name
    pub fn name(&self) -> &str {
        self.feature.name()
    }

    /// Feature default value
    pub fn default_value(&self) -> f32 {
        self.feature.default_value()
    }

    /// Current value: the matched value when used, else the default
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Whether the feature matched the current document
    pub fn used(&self) -> bool {
        self.used
    }
}

// ============================================================================
// FeatureVector
// ============================================================================

/// Slot arena for the features extracted by one segment execution
///
/// Slots are addressed by extraction position: store order covering every
/// feature when full extraction is requested, else the model's declared
/// feature order.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    slots: Vec<FeatureSlot>,
}

impl FeatureVector {
    /// Build the arena for an ordered list of extracted features
    pub fn new(extracted: &[Arc<Feature>]) -> Self {
        FeatureVector {
            slots: extracted.iter().cloned().map(FeatureSlot::new).collect(),
        }
    }

    /// Restore every slot to (default value, unused)
    ///
    /// Runs exactly once before each per-document score computation; the
    /// default must be rewritten even for unused slots because dense
    /// logging reads it from the slot.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.value = slot.feature.default_value();
            slot.used = false;
        }
    }

    /// Record a matched value for the slot at `position`
    pub fn set_matched(&mut self, position: usize, value: f32) {
        let slot = &mut self.slots[position];
        slot.value = value;
        slot.used = true;
    }

    /// Slot at an extraction position
    pub fn slot(&self, position: usize) -> &FeatureSlot {
        &self.slots[position]
    }

    /// All slots in extraction order
    pub fn slots(&self) -> &[FeatureSlot] {
        &self.slots
    }

    /// Number of extracted features
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no features are extracted
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
