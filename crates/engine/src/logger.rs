//! Feature-vector logging
//!
//! This module provides:
//! - RecordFormat: delimited key:value or structured JSON records
//! - RecordMode: dense (every slot) or sparse (used slots only) emission
//! - FeatureLogger: turns a populated vector into one record per document
//!
//! Records feed training pipelines that need the exact feature values the
//! model scored with. The dense/sparse axis here concerns which slots are
//! written out; it is unrelated to the merge engine's cursor-count
//! strategy selection, which happens to use the same vocabulary.

use crate::vector::FeatureVector;
use rescore_core::DocId;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

// ============================================================================
// RecordFormat / RecordMode
// ============================================================================

/// Shape of an emitted feature record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFormat {
    /// Delimited `key:value` pairs, one separator between features
    Csv {
        /// Separator between a feature name and its value
        key_value_sep: char,
        /// Separator between features
        feature_sep: char,
    },
    /// One JSON object per document
    Json,
}

/// Which slots a record includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Every extracted slot, unused ones at their default value
    Dense,
    /// Only the slots whose features matched the document
    Sparse,
}

// ============================================================================
// FeatureLogger
// ============================================================================

/// Serializes the feature vector of a scored document
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLogger {
    format: RecordFormat,
    mode: RecordMode,
    marker: Option<String>,
}

impl FeatureLogger {
    /// Create a csv logger with the default `:` and `;` separators
    pub fn csv(mode: RecordMode) -> Self {
        FeatureLogger {
            format: RecordFormat::Csv {
                key_value_sep: ':',
                feature_sep: ';',
            },
            mode,
            marker: None,
        }
    }

    /// Create a JSON logger
    pub fn json(mode: RecordMode) -> Self {
        FeatureLogger {
            format: RecordFormat::Json,
            mode,
            marker: None,
        }
    }

    /// Builder: override the csv separators
    pub fn with_separators(mut self, key_value_sep: char, feature_sep: char) -> Self {
        if let RecordFormat::Csv {
            key_value_sep: kv,
            feature_sep: fs,
        } = &mut self.format
        {
            *kv = key_value_sep;
            *fs = feature_sep;
        }
        self
    }

    /// Builder: tag every record with a marker field
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Resolve a logger from configuration strings
    ///
    /// Unknown shape or mode strings fall back to csv/sparse with a
    /// warning, mirroring how definitions tolerate older clients.
    pub fn from_config(shape: &str, mode: &str, marker: Option<&str>) -> Self {
        let record_mode = match mode {
            "" | "sparse" => RecordMode::Sparse,
            "dense" => RecordMode::Dense,
            other => {
                tracing::warn!(mode = other, "unknown feature record mode, using sparse");
                RecordMode::Sparse
            }
        };
        let logger = match shape {
            "" | "csv" => FeatureLogger::csv(record_mode),
            "json" => FeatureLogger::json(record_mode),
            other => {
                tracing::warn!(shape = other, "unknown feature record shape, using csv");
                FeatureLogger::csv(record_mode)
            }
        };
        match marker {
            Some(marker) if !marker.is_empty() => logger.with_marker(marker),
            _ => logger,
        }
    }

    /// Emission mode
    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// Build the record for one scored document
    ///
    /// Returns `None` when no features are extracted at all.
    pub fn make_record(&self, doc: DocId, vector: &FeatureVector) -> Option<String> {
        if vector.is_empty() {
            return None;
        }
        let dense = self.mode == RecordMode::Dense;
        match &self.format {
            RecordFormat::Csv {
                key_value_sep,
                feature_sep,
            } => {
                let mut out = String::with_capacity(64);
                out.push_str("_id");
                out.push(*key_value_sep);
                out.push_str(&doc.to_string());
                if let Some(marker) = &self.marker {
                    out.push(*feature_sep);
                    out.push_str("_marker");
                    out.push(*key_value_sep);
                    out.push_str(marker);
                }
                for slot in vector.slots() {
                    if slot.used() || dense {
                        out.push(*feature_sep);
                        out.push_str(slot.name());
                        out.push(*key_value_sep);
                        out.push_str(&slot.value().to_string());
                    }
                }
                Some(out)
            }
            RecordFormat::Json => {
                let record = JsonRecord {
                    doc,
                    marker: self.marker.as_deref(),
                    vector,
                    dense,
                };
                serde_json::to_string(&record).ok()
            }
        }
    }

    /// Emit the record through `tracing`
    ///
    /// Returns whether a record was produced.
    pub fn log(&self, doc: DocId, vector: &FeatureVector) -> bool {
        match self.make_record(doc, vector) {
            Some(record) => {
                tracing::info!(target: "rescore::features", %record, "feature vector");
                true
            }
            None => {
                tracing::info!(target: "rescore::features", doc, "empty feature vector");
                false
            }
        }
    }

    /// Emit the record into an external sink
    pub fn log_to(&self, doc: DocId, vector: &FeatureVector, sink: &mut dyn FnMut(String)) -> bool {
        match self.make_record(doc, vector) {
            Some(record) => {
                sink(record);
                true
            }
            None => false,
        }
    }
}

/// JSON record serialized with the slots in extraction order
struct JsonRecord<'a> {
    doc: DocId,
    marker: Option<&'a str>,
    vector: &'a FeatureVector,
    dense: bool,
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("_id", &self.doc)?;
        if let Some(marker) = self.marker {
            map.serialize_entry("_marker", marker)?;
        }
        map.serialize_entry(
            "vec",
            &JsonVector {
                vector: self.vector,
                dense: self.dense,
            },
        )?;
        map.end()
    }
}

struct JsonVector<'a> {
    vector: &'a FeatureVector,
    dense: bool,
}

impl Serialize for JsonVector<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for slot in self.vector.slots() {
            if slot.used() || self.dense {
                map.serialize_entry(slot.name(), &slot.value())?;
            }
        }
        map.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
