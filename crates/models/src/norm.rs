//! Feature value normalization
//!
//! This module provides:
//! - Normalizer: the closed set of normalization transforms
//!
//! After raw feature values have been assembled for a document, each model
//! feature's normalizer is applied and the resulting values feed the model.
//! Normalizers are pure and stateless given their parameters; parameter
//! validation happens at construction, never at normalize time.
//!
//! Example definition:
//!
//! ```json
//! { "class": "standard", "params": { "avg": 42, "std": 6 } }
//! ```
//!
//! normalizes 39 to -0.5, 42 to 0 and 45 to +0.5.

use rescore_core::{Error, Explanation, Result};

// ============================================================================
// Normalizer
// ============================================================================

/// A pure transform applied to a raw feature value before scoring
#[derive(Debug, Clone, PartialEq)]
pub enum Normalizer {
    /// Pass the value through unchanged
    Identity,
    /// Scale around an average-and-standard-deviation distribution
    Standard {
        /// Distribution average
        avg: f32,
        /// Distribution standard deviation, strictly positive
        std: f32,
    },
    /// Scale into the range spanned by `min..max`
    MinMax {
        /// Lower bound mapped to 0
        min: f32,
        /// Upper bound mapped to 1
        max: f32,
    },
}

impl Normalizer {
    /// Create a standard normalizer; `std` must be positive
    pub fn standard(avg: f32, std: f32) -> Result<Self> {
        if std <= 0.0 {
            return Err(Error::Normalizer(format!(
                "standard normalizer standard deviation must be positive | avg = {avg}, std = {std}"
            )));
        }
        Ok(Normalizer::Standard { avg, std })
    }

    /// Create a min/max normalizer; the delta must not be zero
    pub fn min_max(min: f32, max: f32) -> Result<Self> {
        let delta = max - min;
        if delta == 0.0 {
            return Err(Error::Normalizer(format!(
                "min/max normalizer delta must not be zero | min = {min}, max = {max}, delta = {delta}"
            )));
        }
        Ok(Normalizer::MinMax { min, max })
    }

    /// Apply the transform
    pub fn normalize(&self, value: f32) -> f32 {
        match self {
            Normalizer::Identity => value,
            Normalizer::Standard { avg, std } => (value - avg) / std,
            Normalizer::MinMax { min, max } => (value - min) / (max - min),
        }
    }

    /// Whether this is the identity transform
    pub fn is_identity(&self) -> bool {
        matches!(self, Normalizer::Identity)
    }

    /// Wrap a feature explanation with the normalized value
    ///
    /// The identity normalizer passes the explanation through untouched.
    pub fn explain(&self, inner: Explanation) -> Explanation {
        if self.is_identity() {
            return inner;
        }
        let normalized = self.normalize(inner.value());
        Explanation::with_details(
            normalized,
            format!("normalized using {self:?}"),
            vec![inner],
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
