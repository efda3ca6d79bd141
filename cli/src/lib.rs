//! Library side of the `memoproxy` binary: drive a list of inputs through a caching proxy and
//! collect a report that `main` prints as text or JSON.

use std::fmt::Display;
use std::sync::Arc;

use memoproxy::{
    CacheStats, CacheStatus, CachingProxy, EchoModel, ModelKind, PredictError, Predictor,
    SentimentModel, Validated,
};
use serde::Serialize;
use tracing::Instrument;

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub model: ModelKind,
    /// Reject blank inputs before they reach the proxy.
    pub validate: bool,
}

/// Outcome for one input.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunRecord {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CacheStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    fn ok(input: &str, output: serde_json::Value, status: CacheStatus) -> Self {
        Self {
            input: input.to_string(),
            output: Some(output),
            status: Some(status),
            error: None,
        }
    }

    fn failed(input: &str, error: impl Display) -> Self {
        Self {
            input: input.to_string(),
            output: None,
            status: None,
            error: Some(error.to_string()),
        }
    }

    /// Output as plain text: strings unquoted, other JSON values as-is.
    pub fn output_text(&self) -> Option<String> {
        self.output.as_ref().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub model: String,
    pub results: Vec<RunRecord>,
    pub stats: CacheStats,
    /// Times the underlying model was actually invoked.
    pub model_calls: usize,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.error.is_some())
    }

    /// One-line summary printed after the results in text mode.
    pub fn summary_line(&self) -> String {
        format!(
            "calls={} hits={} misses={} entries={}",
            self.model_calls, self.stats.hits, self.stats.misses, self.stats.entries
        )
    }
}

/// Runs `inputs` in order through a fresh proxy over the selected demo model.
pub async fn run(inputs: &[String], opts: &RunOptions) -> RunReport {
    let span = tracing::info_span!("run", model = %opts.model, inputs = inputs.len());
    run_inner(inputs, opts).instrument(span).await
}

async fn run_inner(inputs: &[String], opts: &RunOptions) -> RunReport {
    tracing::info!("run started");

    let (results, stats, model_calls) = match opts.model {
        ModelKind::Echo => {
            let model = Arc::new(EchoModel::new());
            let guarded = Validated::new(CachingProxy::new(Arc::clone(&model)));
            let results = drive(&guarded, inputs, opts.validate).await;
            (results, guarded.inner().stats(), model.calls())
        }
        ModelKind::Sentiment => {
            let model = Arc::new(SentimentModel::new());
            let guarded = Validated::new(CachingProxy::new(Arc::clone(&model)));
            let results = drive(&guarded, inputs, opts.validate).await;
            (results, guarded.inner().stats(), model.calls())
        }
    };

    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        model_calls,
        "run finished"
    );
    RunReport {
        model: opts.model.to_string(),
        results,
        stats,
        model_calls,
    }
}

/// Runs inputs in order; with `validate` off the validation layer is bypassed.
async fn drive<P>(
    guarded: &Validated<CachingProxy<P>>,
    inputs: &[String],
    validate: bool,
) -> Vec<RunRecord>
where
    P: Predictor<Input = String, Error = PredictError>,
    P::Output: Serialize,
{
    let mut records = Vec::with_capacity(inputs.len());
    for input in inputs {
        let outcome = if validate {
            guarded.predict_with_status(input).await
        } else {
            guarded.inner().predict_with_status(input).await
        };
        let record = match outcome {
            Ok((value, status)) => match serde_json::to_value(&value) {
                Ok(json) => RunRecord::ok(input, json, status),
                Err(e) => RunRecord::failed(input, e),
            },
            Err(e) => RunRecord::failed(input, e),
        };
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn echo_run_reports_hit_on_repeat() {
        let report = run(
            &strings(&["Some input text", "Some input text"]),
            &RunOptions::default(),
        )
        .await;
        assert_eq!(report.model, "echo");
        assert_eq!(report.model_calls, 1);
        assert_eq!(report.results[0].status, Some(CacheStatus::Miss));
        assert_eq!(report.results[1].status, Some(CacheStatus::Hit));
        assert_eq!(
            report.results[1].output_text().as_deref(),
            Some("Prediction for Some input text")
        );
        assert_eq!(report.summary_line(), "calls=1 hits=1 misses=1 entries=1");
    }

    #[tokio::test]
    async fn sentiment_run_matches_walkthrough() {
        let opts = RunOptions {
            model: ModelKind::Sentiment,
            validate: false,
        };
        let report = run(
            &strings(&["happy face", "sad face", "cat face", "sad face", "cat face"]),
            &opts,
        )
        .await;
        let outputs: Vec<_> = report
            .results
            .iter()
            .map(|r| r.output_text().unwrap())
            .collect();
        assert_eq!(outputs, vec!["1", "-1", "0", "-1", "0"]);
        assert_eq!(report.model_calls, 3);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn validation_failure_is_recorded_and_run_continues() {
        let opts = RunOptions {
            model: ModelKind::Echo,
            validate: true,
        };
        let report = run(&strings(&["", "ok"]), &opts).await;
        assert!(report.has_failures());
        assert_eq!(
            report.results[0].error.as_deref(),
            Some("invalid input: input must be a non-empty string")
        );
        assert_eq!(report.results[1].status, Some(CacheStatus::Miss));
        assert_eq!(report.model_calls, 1);
        assert_eq!(report.stats.entries, 1);
    }

    #[tokio::test]
    async fn blank_input_without_validation_reaches_model() {
        let report = run(&strings(&["", ""]), &RunOptions::default()).await;
        assert!(!report.has_failures());
        assert_eq!(report.results[0].output_text().as_deref(), Some("Prediction for "));
        assert_eq!(report.results[1].status, Some(CacheStatus::Hit));
        assert_eq!(report.model_calls, 1);
    }

    #[test]
    fn record_json_omits_empty_fields() {
        let rec = RunRecord::failed("", "boom");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json, serde_json::json!({ "input": "", "error": "boom" }));
    }
}
