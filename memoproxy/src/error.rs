//! Errors raised by the validation layer and the bundled demo models.
//!
//! The caching types never define their own error: a wrapped model's error is
//! handed back to the caller as-is.

use thiserror::Error;

/// Input rejected before it reaches a model or a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input: {reason}")]
pub struct InvalidInput {
    pub reason: String,
}

impl InvalidInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Error type shared by [`EchoModel`](crate::EchoModel), [`SentimentModel`](crate::SentimentModel)
/// and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// Request failed validation; the model was never called.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    /// The model itself failed.
    #[error("model error: {0}")]
    Model(String),
}
