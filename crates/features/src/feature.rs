//! Feature definitions
//!
//! This module provides:
//! - Feature: name, stable index, default value and capability
//! - FeatureKind: the closed set of feature capabilities
//! - Cursor binding against a SegmentSource and request parameters
//!
//! A feature is a recipe for deriving one numeric value per document. The
//! capability set is a closed enum: adding a new feature kind is a
//! compile-time extension, not a runtime plugin load.

use crate::segment::SegmentSource;
use once_cell::sync::Lazy;
use regex::Regex;
use rescore_core::cursor::{FeatureCursor, MatchAllCursor};
use rescore_core::{Error, ExternalParams, Result};

/// Placeholders of the form `${param}` inside query templates.
static TEMPLATE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("valid placeholder regex"));

// ============================================================================
// FeatureKind
// ============================================================================

/// Capability of a feature: how its per-document value is derived
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    /// Fixed value for every document
    Constant {
        /// The constant value
        value: f32,
    },

    /// Value of a per-request external parameter
    ///
    /// When the parameter is absent and `required` is set, binding fails;
    /// otherwise the feature silently falls back to its default value.
    ExternalValue {
        /// Parameter name to look up
        key: String,
        /// Whether the parameter must be present in the request
        required: bool,
    },

    /// Length (in terms) of a document field
    FieldLength {
        /// Field to measure
        field: String,
    },

    /// Numeric value of a stored or source field
    FieldValue {
        /// Field to read
        field: String,
        /// Read from the document source instead of stored fields
        from_source: bool,
    },

    /// Score of a host sub-query
    ///
    /// The template may contain `${param}` placeholders substituted from
    /// the request's external parameters before the host parses it. Every
    /// placeholder is required.
    Query {
        /// Query template handed to the host after substitution
        template: String,
        /// Placeholder names extracted from the template
        required_params: Vec<String>,
    },
}

impl FeatureKind {
    /// Build a query-kind capability, extracting its placeholders
    pub fn query(template: impl Into<String>) -> Self {
        let template = template.into();
        let required_params = TEMPLATE_PARAM
            .captures_iter(&template)
            .map(|c| c[1].to_string())
            .collect();
        FeatureKind::Query {
            template,
            required_params,
        }
    }

    /// Short class name, as used in configuration
    pub fn class(&self) -> &'static str {
        match self {
            FeatureKind::Constant { .. } => "value",
            FeatureKind::ExternalValue { .. } => "external_value",
            FeatureKind::FieldLength { .. } => "field_length",
            FeatureKind::FieldValue { .. } => "field_value",
            FeatureKind::Query { .. } => "query",
        }
    }
}

// ============================================================================
// Feature
// ============================================================================

/// A named, indexed recipe for deriving one numeric value per document
///
/// Owned by a [`FeatureStore`](crate::FeatureStore); immutable after
/// construction. The index is assigned by the store, is stable across
/// redefinitions and is used for array-positional access to the feature
/// vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    name: String,
    index: usize,
    default_value: f32,
    kind: FeatureKind,
}

impl Feature {
    /// Create a feature definition
    ///
    /// Callers go through [`FeatureStore::define`](crate::FeatureStore::define),
    /// which assigns the index and validates the configuration.
    pub(crate) fn new(name: String, index: usize, default_value: f32, kind: FeatureKind) -> Self {
        Feature {
            name,
            index,
            default_value,
            kind,
        }
    }

    /// Feature name, unique within its store
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable index within the owning store
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value used when the feature does not match a document
    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    /// Capability of this feature
    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    // ========================================================================
    // Cursor binding
    // ========================================================================

    /// Bind this feature to a segment for one request
    ///
    /// Returns `Ok(None)` when the feature cannot match any document of the
    /// segment (it then scores at its default everywhere). Errors follow
    /// the per-request taxonomy: [`Error::MissingRequiredInput`] for absent
    /// required parameters, [`Error::Evaluation`] for host failures.
    pub fn bind(
        &self,
        segment: &dyn SegmentSource,
        params: &ExternalParams,
    ) -> Result<Option<Box<dyn FeatureCursor>>> {
        match &self.kind {
            FeatureKind::Constant { value } => Ok(Some(Box::new(MatchAllCursor::new(
                *value,
                segment.max_doc(),
            )))),

            FeatureKind::ExternalValue { key, required } => match params.get_f32(key) {
                Some(value) => Ok(Some(Box::new(MatchAllCursor::new(
                    value,
                    segment.max_doc(),
                )))),
                None if *required => Err(Error::MissingRequiredInput {
                    feature: self.name.clone(),
                    key: key.clone(),
                }),
                None => Ok(None),
            },

            FeatureKind::FieldLength { field } => segment.field_length_cursor(field),

            FeatureKind::FieldValue { field, from_source } => {
                segment.field_value_cursor(field, *from_source)
            }

            FeatureKind::Query {
                template,
                required_params,
            } => {
                let rendered = self.render_template(template, required_params, params)?;
                segment.query_cursor(&rendered)
            }
        }
    }

    /// Substitute `${param}` placeholders from the request parameters
    fn render_template(
        &self,
        template: &str,
        required_params: &[String],
        params: &ExternalParams,
    ) -> Result<String> {
        let mut rendered = template.to_string();
        for key in required_params {
            let value = params
                .get_text(key)
                .ok_or_else(|| Error::MissingRequiredInput {
                    feature: self.name.clone(),
                    key: key.clone(),
                })?;
            // Escaping keeps the substituted template a valid JSON string.
            let escaped = value.replace('"', "\\\"");
            rendered = rendered.replace(&format!("${{{key}}}"), &escaped);
        }
        Ok(rendered)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::InMemorySegment;
    use rescore_core::TERMINATED;

    fn feature(kind: FeatureKind) -> Feature {
        Feature::new("f".to_string(), 0, 0.0, kind)
    }

    #[test]
    fn test_constant_binds_match_all() {
        let segment = InMemorySegment::new(5);
        let f = feature(FeatureKind::Constant { value: 42.0 });
        let mut cursor = f.bind(&segment, &ExternalParams::new()).unwrap().unwrap();
        assert_eq!(cursor.doc(), 0);
        assert_eq!(cursor.value().unwrap(), 42.0);
        assert_eq!(cursor.advance_to(5), TERMINATED);
    }

    #[test]
    fn test_external_value_present() {
        let segment = InMemorySegment::new(5);
        let f = feature(FeatureKind::ExternalValue {
            key: "fromMobile".to_string(),
            required: true,
        });
        let params = ExternalParams::new().with("fromMobile", 1.0_f32);
        let mut cursor = f.bind(&segment, &params).unwrap().unwrap();
        assert_eq!(cursor.value().unwrap(), 1.0);
    }

    #[test]
    fn test_external_value_missing_required() {
        let segment = InMemorySegment::new(5);
        let f = feature(FeatureKind::ExternalValue {
            key: "fromMobile".to_string(),
            required: true,
        });
        let err = f.bind(&segment, &ExternalParams::new()).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredInput { .. }));
    }

    #[test]
    fn test_external_value_missing_optional_falls_back() {
        let segment = InMemorySegment::new(5);
        let f = feature(FeatureKind::ExternalValue {
            key: "fromMobile".to_string(),
            required: false,
        });
        assert!(f.bind(&segment, &ExternalParams::new()).unwrap().is_none());
    }

    #[test]
    fn test_query_placeholder_extraction() {
        let kind = FeatureKind::query(r#"{"term":{"category":"${intent}"}}"#);
        match &kind {
            FeatureKind::Query {
                required_params, ..
            } => assert_eq!(required_params, &vec!["intent".to_string()]),
            _ => panic!("expected query kind"),
        }
    }

    #[test]
    fn test_query_template_substitution() {
        let rendered = r#"{"term":{"category":"company"}}"#;
        let segment = InMemorySegment::new(5).with_query(rendered, vec![(1, 0.5)]);
        let f = feature(FeatureKind::query(r#"{"term":{"category":"${intent}"}}"#));
        let params = ExternalParams::new().with("intent", "company");
        let cursor = f.bind(&segment, &params).unwrap().unwrap();
        assert_eq!(cursor.doc(), 1);
    }

    #[test]
    fn test_query_template_missing_param() {
        let segment = InMemorySegment::new(5);
        let f = feature(FeatureKind::query(r#"{"term":{"q":"${user_query}"}}"#));
        let err = f.bind(&segment, &ExternalParams::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredInput { ref key, .. } if key == "user_query"
        ));
    }

    #[test]
    fn test_query_template_escapes_quotes() {
        let f = feature(FeatureKind::query(r#"{"match":{"t":"${q}"}}"#));
        let params = ExternalParams::new().with("q", r#"say "hi""#);
        let rendered = match f.kind() {
            FeatureKind::Query {
                template,
                required_params,
            } => f.render_template(template, required_params, &params).unwrap(),
            _ => unreachable!(),
        };
        assert_eq!(rendered, r#"{"match":{"t":"say \"hi\""}}"#);
    }

    #[test]
    fn test_kind_class_names() {
        assert_eq!(FeatureKind::Constant { value: 1.0 }.class(), "value");
        assert_eq!(FeatureKind::query("q").class(), "query");
    }
}
