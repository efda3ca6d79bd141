//! Demo models used by the CLI and tests.
//!
//! Both count how many times they were invoked, which is how cache effectiveness is observed.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::PredictError;
use crate::predictor::Predictor;

/// Answers `"Prediction for <input>"`.
#[derive(Debug, Default)]
pub struct EchoModel {
    calls: AtomicUsize,
}

impl EchoModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `predict` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Predictor for EchoModel {
    type Input = String;
    type Output = String;
    type Error = PredictError;

    async fn predict(&self, input: &String) -> Result<String, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(input = %input, "echo model predicting");
        Ok(format!("Prediction for {}", input))
    }
}

/// Keyword sentiment: `1` for "happy", `-1` for "sad", `0` otherwise. "happy" is checked first.
#[derive(Debug, Default)]
pub struct SentimentModel {
    calls: AtomicUsize,
}

impl SentimentModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn classify(text: &str) -> i64 {
        if text.contains("happy") {
            1
        } else if text.contains("sad") {
            -1
        } else {
            0
        }
    }
}

#[async_trait]
impl Predictor for SentimentModel {
    type Input = String;
    type Output = i64;
    type Error = PredictError;

    async fn predict(&self, input: &String) -> Result<i64, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(input = %input, "sentiment model predicting");
        Ok(Self::classify(input))
    }
}

/// Which demo model to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    Echo,
    Sentiment,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Echo => "echo",
            ModelKind::Sentiment => "sentiment",
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "echo" => Ok(Self::Echo),
            "sentiment" => Ok(Self::Sentiment),
            _ => Err(format!(
                "unknown model: {} (use echo or sentiment)",
                s
            )),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
