//! Per-segment model execution
//!
//! This module provides:
//! - ScoringContext: one rescoring request (model, parameters, extraction)
//! - SegmentScorer: the context bound to one query segment
//! - RescoreKey: structural cache key for bound contexts
//!
//! # Flow
//!
//! ```text
//! ScoringContext ── bind(segment) ──▶ SegmentScorer
//!                                        │ advance_to(doc)
//!                                        ▼
//!                       reset vector ─▶ merge fills matches
//!                                        │ normalize model subset
//!                                        ▼
//!                                  model score / explain
//! ```
//!
//! A SegmentScorer is single-threaded state: it owns its cursors, the
//! feature vector and the normalized buffer, and is never shared across
//! concurrent document evaluations. The model definition behind it is
//! immutable and shared freely.

use crate::logger::FeatureLogger;
use crate::traversal::{SubCursor, Traversal};
use crate::vector::FeatureVector;
use rescore_core::{DocId, Explanation, ExternalParams, Result};
use rescore_features::SegmentSource;
use rescore_models::ScoringModel;
use std::sync::Arc;

// ============================================================================
// ScoringContext
// ============================================================================

/// One rescoring request: a model plus its per-request inputs
///
/// Binding the context to a segment builds the cursors and scratch state
/// for that segment; the context itself stays immutable and can be bound
/// to any number of segments in turn.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    model: Arc<ScoringModel>,
    params: ExternalParams,
    extract_all: bool,
    logger: Option<FeatureLogger>,
}

impl ScoringContext {
    /// Create a context for a model with empty parameters
    pub fn new(model: Arc<ScoringModel>) -> Self {
        ScoringContext {
            model,
            params: ExternalParams::new(),
            extract_all: false,
            logger: None,
        }
    }

    /// Builder: set the per-request external parameters
    pub fn with_params(mut self, params: ExternalParams) -> Self {
        self.params = params;
        self
    }

    /// Builder: extract every feature of the model's store, not only the
    /// model's own features
    ///
    /// Full extraction feeds training-data logging; scoring itself only
    /// ever reads the model subset.
    pub fn extract_all(mut self, extract_all: bool) -> Self {
        self.extract_all = extract_all;
        self
    }

    /// Builder: log each scored document's feature vector
    pub fn with_logger(mut self, logger: FeatureLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The model this context scores with
    pub fn model(&self) -> &Arc<ScoringModel> {
        &self.model
    }

    /// The request's external parameters
    pub fn params(&self) -> &ExternalParams {
        &self.params
    }

    /// Structural cache key for this context
    ///
    /// Two contexts with the same model structure, parameters and
    /// extraction flag produce equal keys; useful for caching bound
    /// contexts across identical requests.
    pub fn cache_key(&self) -> RescoreKey {
        RescoreKey {
            model: self.model.name().to_string(),
            store: self.model.store_name().to_string(),
            // Feature, normalizer and algorithm parameters all render into
            // the structure string, so equal keys mean equal models.
            structure: format!("{:?}", self.model),
            extract_all: self.extract_all,
            params: self.params.clone(),
        }
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Bind this context to one query segment
    ///
    /// Builds one cursor per extracted feature (features that cannot match
    /// this segment contribute no cursor and score at their default) and
    /// selects the merge strategy from the resulting cursor count.
    /// Binding failures (absent required inputs, host errors) abort this
    /// segment's evaluation and surface to the caller.
    pub fn bind(&self, segment: &dyn SegmentSource) -> Result<SegmentScorer> {
        let extracted = if self.extract_all {
            self.model.all_features()
        } else {
            self.model.features()
        };

        let mut cursors = Vec::with_capacity(extracted.len());
        for (position, feature) in extracted.iter().enumerate() {
            if let Some(cursor) = feature.bind(segment, &self.params)? {
                cursors.push(SubCursor::new(position, cursor));
            }
        }
        tracing::debug!(
            model = %self.model.name(),
            extracted = extracted.len(),
            cursors = cursors.len(),
            "bound scoring context to segment"
        );

        // With full extraction the extracted list is the store in index
        // order, so a model feature's slot is its store index; otherwise
        // the extracted list is the model list itself.
        let model_slots: Vec<usize> = if self.extract_all {
            self.model.features().iter().map(|f| f.index()).collect()
        } else {
            (0..self.model.features().len()).collect()
        };

        let vector = FeatureVector::new(extracted);
        let normalized = vec![0.0; self.model.features().len()];

        Ok(SegmentScorer {
            model: Arc::clone(&self.model),
            traversal: Traversal::new(cursors),
            vector,
            normalized,
            model_slots,
            logger: self.logger.clone(),
        })
    }
}

// ============================================================================
// RescoreKey
// ============================================================================

/// Structural identity of a scoring context
///
/// Replaces object identity: equality is defined by model name, store,
/// rendered model structure, extraction flag and external parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RescoreKey {
    model: String,
    store: String,
    structure: String,
    extract_all: bool,
    params: ExternalParams,
}

// ============================================================================
// SegmentScorer
// ============================================================================

/// A scoring context bound to one query segment
///
/// Drives the merge engine document by document. All scratch state (the
/// feature vector and the normalized buffer) is owned here and reused
/// across documents.
pub struct SegmentScorer {
    model: Arc<ScoringModel>,
    traversal: Traversal,
    vector: FeatureVector,
    normalized: Vec<f32>,
    model_slots: Vec<usize>,
    logger: Option<FeatureLogger>,
}

impl std::fmt::Debug for SegmentScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentScorer")
            .field("model_slots", &self.model_slots)
            .field("has_logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl SegmentScorer {
    /// Request a document; always returns the requested id
    pub fn advance_to(&mut self, target: DocId) -> DocId {
        self.traversal.advance_to(target)
    }

    /// Request the document after the current one
    pub fn next_doc(&mut self) -> DocId {
        self.traversal.next_doc()
    }

    /// Document most recently requested, if any
    pub fn doc(&self) -> Option<DocId> {
        self.traversal.doc()
    }

    /// Score the current document
    ///
    /// Always produces a score: documents no feature matched score from
    /// the all-default vector. Repeated calls without an intervening
    /// advance return identical results.
    pub fn score(&mut self) -> Result<f32> {
        self.vector.reset();
        self.traversal.fill_matches(&mut self.vector)?;

        for (position, &slot) in self.model_slots.iter().enumerate() {
            self.normalized[position] = self.vector.slot(slot).value();
        }
        self.model.normalize_in_place(&mut self.normalized);
        let score = self.model.score(&self.normalized);

        if let (Some(logger), Some(doc)) = (&self.logger, self.traversal.doc()) {
            logger.log(doc, &self.vector);
        }
        Ok(score)
    }

    /// Explain the current document's score
    ///
    /// Replays the same values through per-feature explanations, the
    /// normalizers and the model's own composition.
    pub fn explain(&mut self) -> Result<Explanation> {
        let score = self.score()?;
        let mut feature_explanations = Vec::with_capacity(self.model_slots.len());
        for (position, &slot) in self.model_slots.iter().enumerate() {
            let slot = self.vector.slot(slot);
            let raw = if slot.used() {
                Explanation::leaf(slot.value(), format!("feature {}: matched value", slot.name()))
            } else {
                Explanation::leaf(
                    slot.value(),
                    format!("feature {}: default value, no match", slot.name()),
                )
            };
            feature_explanations.push(self.model.normalizer_explanation(position, raw));
        }
        Ok(self.model.explain(score, &feature_explanations))
    }

    /// The raw feature vector of the most recent score computation
    pub fn feature_vector(&self) -> &FeatureVector {
        &self.vector
    }

    /// The model this scorer evaluates
    pub fn model(&self) -> &Arc<ScoringModel> {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
