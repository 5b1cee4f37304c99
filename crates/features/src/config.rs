//! Feature configuration shapes
//!
//! This module provides:
//! - FeatureConfig: the `{ name, class, params }` definition shape
//! - FeatureParams: the per-class parameter bag
//!
//! Definitions arrive as JSON from the configuration layer and are compiled
//! into [`Feature`](crate::Feature) values by the store. All structural
//! problems are reported at compile time, never during scoring.
//!
//! Example definition:
//!
//! ```json
//! {
//!   "name": "isPerson",
//!   "class": "query",
//!   "params": { "q": { "term": { "category": "${intent}" } } }
//! }
//! ```

use crate::feature::FeatureKind;
use rescore_core::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// FeatureConfig
// ============================================================================

/// One feature definition as supplied by the configuration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Feature name, unique within its store
    pub name: String,
    /// Feature class: `value`, `external_value`, `field_length`,
    /// `field_value` or `query`
    pub class: String,
    /// Class-specific parameters
    #[serde(default)]
    pub params: FeatureParams,
}

/// Class-specific feature parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureParams {
    /// Constant value (`value` class)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,

    /// External parameter name (`external_value` class)
    #[serde(rename = "externalValue", skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,

    /// Whether the external parameter must be present in the request
    #[serde(default)]
    pub required: bool,

    /// Field name (`field_length` and `field_value` classes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Read the field from the document source instead of stored fields
    #[serde(default)]
    pub source: bool,

    /// Query template (`query` class); a JSON object or string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<serde_json::Value>,

    /// Value used when the feature does not match a document
    #[serde(rename = "defaultValue", default)]
    pub default_value: f32,
}

impl FeatureConfig {
    /// Compile the definition into a feature capability
    ///
    /// Fails with [`Error::Feature`] on unknown classes and missing or
    /// empty required parameters.
    pub fn compile_kind(&self) -> Result<FeatureKind> {
        match self.class.as_str() {
            "value" => {
                let value = self.params.value.ok_or_else(|| {
                    Error::Feature(format!("feature {}: no 'value' param provided", self.name))
                })?;
                Ok(FeatureKind::Constant { value })
            }

            "external_value" => {
                let key = self.non_empty(self.params.external_value.as_deref(), "externalValue")?;
                Ok(FeatureKind::ExternalValue {
                    key,
                    required: self.params.required,
                })
            }

            "field_length" => {
                let field = self.non_empty(self.params.field.as_deref(), "field")?;
                Ok(FeatureKind::FieldLength { field })
            }

            "field_value" => {
                let field = self.non_empty(self.params.field.as_deref(), "field")?;
                Ok(FeatureKind::FieldValue {
                    field,
                    from_source: self.params.source,
                })
            }

            "query" => {
                let template = match &self.params.q {
                    Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                    Some(serde_json::Value::String(_)) | None => {
                        return Err(Error::Feature(format!(
                            "feature {}: 'q' must be provided",
                            self.name
                        )))
                    }
                    Some(value) => serde_json::to_string(value).map_err(|e| {
                        Error::Feature(format!("feature {}: invalid 'q' param: {e}", self.name))
                    })?,
                };
                Ok(FeatureKind::query(template))
            }

            other => Err(Error::Feature(format!(
                "feature class does not exist: {other}"
            ))),
        }
    }

    fn non_empty(&self, value: Option<&str>, param: &str) -> Result<String> {
        match value {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(Error::Feature(format!(
                "feature {}: '{param}' must be provided",
                self.name
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
