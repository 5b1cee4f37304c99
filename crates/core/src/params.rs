//! Per-request external parameters
//!
//! This module provides:
//! - ParamValue: a string or numeric parameter value
//! - ExternalParams: the ordered key/value map handed in with a rescoring
//!   request and read by parameter-dependent features
//!
//! Parameters carry request-scoped signals (query intent, device class,
//! user identifiers) that features can turn into values. The map is
//! ordered so that two requests with the same content compare and hash
//! equal regardless of insertion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

// ============================================================================
// ParamValue
// ============================================================================

/// A single external parameter value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Textual value
    Str(String),
    /// Numeric value
    Num(f64),
}

impl ParamValue {
    /// Numeric view of the value, parsing text if necessary
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Num(n) => Some(*n as f32),
            ParamValue::Str(s) => s.parse::<f32>().ok(),
        }
    }

    /// Textual view of the value
    pub fn as_text(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Num(n) => n.to_string(),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Str(a), ParamValue::Str(b)) => a == b,
            // Bit equality keeps Eq and Hash consistent for floats.
            (ParamValue::Num(a), ParamValue::Num(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ParamValue::Str(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            ParamValue::Num(n) => {
                1u8.hash(state);
                n.to_bits().hash(state);
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Num(n)
    }
}

impl From<f32> for ParamValue {
    fn from(n: f32) -> Self {
        ParamValue::Num(f64::from(n))
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Num(f64::from(n))
    }
}

// ============================================================================
// ExternalParams
// ============================================================================

/// Ordered map of per-request external parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalParams {
    values: BTreeMap<String, ParamValue>,
}

impl ExternalParams {
    /// Create an empty parameter map
    pub fn new() -> Self {
        ExternalParams::default()
    }

    /// Builder: add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Numeric view of a parameter, if present and parseable
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.values.get(key).and_then(ParamValue::as_f32)
    }

    /// Textual view of a parameter, if present
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(ParamValue::as_text)
    }

    /// Whether the map holds no parameters
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder_and_lookup() {
        let params = ExternalParams::new()
            .with("queryIntent", "company")
            .with("fromMobile", 1.0_f32);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get_text("queryIntent").unwrap(), "company");
        assert_eq!(params.get_f32("fromMobile").unwrap(), 1.0);
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_numeric_parse_from_text() {
        let params = ExternalParams::new().with("boost", "2.5");
        assert_eq!(params.get_f32("boost").unwrap(), 2.5);
    }

    #[test]
    fn test_non_numeric_text_is_not_a_number() {
        let params = ExternalParams::new().with("intent", "news");
        assert!(params.get_f32("intent").is_none());
    }

    #[test]
    fn test_insertion_order_does_not_affect_equality() {
        let a = ExternalParams::new()
            .with("queryIntent", "company")
            .with("user_query", "abc");
        let b = ExternalParams::new()
            .with("user_query", "abc")
            .with("queryIntent", "company");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_affects_equality() {
        let a = ExternalParams::new().with("queryIntent", "company");
        let b = ExternalParams::new().with("queryIntent", "person");
        assert_ne!(a, b);
        assert_ne!(a, ExternalParams::new());
    }

    #[test]
    fn test_deserialize_from_json() {
        let params: ExternalParams =
            serde_json::from_str(r#"{"queryIntent": "company", "fromMobile": 1}"#).unwrap();
        assert_eq!(params.get_text("queryIntent").unwrap(), "company");
        assert_eq!(params.get_f32("fromMobile").unwrap(), 1.0);
    }
}
