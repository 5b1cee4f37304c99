//! Error types for the rescoring engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Configuration problems (bad feature, model or normalizer definitions) are
//! detected once when a definition is compiled and are fatal for that load.
//! Per-document problems (missing required inputs, evaluator failures) abort
//! only the affected evaluation.

use thiserror::Error;

/// Result type alias for rescore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the rescoring engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid feature definition (missing params, unknown class, ...)
    #[error("feature error: {0}")]
    Feature(String),

    /// Invalid model definition (missing weights, empty feature list, malformed tree, ...)
    #[error("model error: {0}")]
    Model(String),

    /// Invalid normalizer definition (non-positive std, zero min/max delta, ...)
    #[error("normalizer error: {0}")]
    Normalizer(String),

    /// A required per-request input was not supplied
    #[error("feature {feature} requires input {key} that was not passed in the request")]
    MissingRequiredInput {
        /// Feature that declared the input as required
        feature: String,
        /// Name of the absent parameter
        key: String,
    },

    /// A feature evaluator failed while computing a value
    #[error("unable to extract feature {feature}: {message}")]
    Evaluation {
        /// Feature whose cursor failed
        feature: String,
        /// Underlying failure description
        message: String,
    },
}

impl Error {
    /// Wrap an arbitrary evaluator failure with feature-name context
    pub fn evaluation(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Evaluation {
            feature: feature.into(),
            message: message.into(),
        }
    }
}
