// Data models shared by the agents, the pipeline and the HTTP layer

pub mod state_machine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pipeline shape selected when a run starts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Default,
    Explore,
    Summarize,
    Simulate,
}

impl RunMode {
    /// Returns all run modes
    pub fn all() -> &'static [RunMode] {
        &[
            RunMode::Default,
            RunMode::Explore,
            RunMode::Summarize,
            RunMode::Simulate,
        ]
    }

    /// Returns the string representation of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Default => "default",
            RunMode::Explore => "explore",
            RunMode::Summarize => "summarize",
            RunMode::Simulate => "simulate",
        }
    }

    /// Select the pipeline for a caller-supplied mode string.
    /// Anything unrecognized runs the full default pipeline.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "explore" => RunMode::Explore,
            "summarize" => RunMode::Summarize,
            "simulate" => RunMode::Simulate,
            _ => RunMode::Default,
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a run. There is no persisted "running" value:
/// logs accumulate while the phase stays `Initialized`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Initialized,
    Completed,
    Error,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Initialized => "initialized",
            RunPhase::Completed => "completed",
            RunPhase::Error => "error",
        }
    }
}

/// Status record for one run, as returned by `GET /status/{run_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub phase: RunPhase,
    /// Append-only, in pipeline execution order
    pub logs: Vec<String>,
    /// Mode string exactly as the caller supplied it
    pub mode: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatus {
    pub fn new(mode: &str) -> Self {
        Self {
            phase: RunPhase::Initialized,
            logs: Vec::new(),
            mode: mode.to_string(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Terminal artifact of a completed run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Opaque structured results (experiment output or exploration lists)
    pub results: Value,
    /// `{critique, confidence}` or an empty object
    pub critique: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Paper {
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            results: Value::Object(Default::default()),
            critique: Value::Object(Default::default()),
            meta: None,
        }
    }

    pub fn with_results(mut self, results: Value) -> Self {
        self.results = results;
        self
    }

    pub fn with_critique(mut self, critique: Value) -> Self {
        self.critique = critique;
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// A research domain proposed by the scout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Domain {
    pub name: String,
    /// Nominally 0-1, not enforced
    pub confidence: f64,
}

impl Domain {
    pub fn new(name: &str, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            confidence,
        }
    }

    /// `{name, confidence}` as stored in a run's domain list
    pub fn to_value(&self) -> Value {
        serde_json::json!({"name": self.name, "confidence": self.confidence})
    }
}

/// One synthetic observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DatasetRow {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub feature: f64,
    #[serde(default)]
    pub label: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatasetMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub rows: Vec<DatasetRow>,
    pub meta: DatasetMeta,
}

impl Dataset {
    /// Empty dataset carrying the reason synthesis failed
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            meta: DatasetMeta {
                error: Some(error.into()),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AccuracySummary {
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RowCountDetails {
    pub n_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetails {
    pub error: String,
}

/// Output of the experiment designer.
///
/// Serializes to one of three shapes:
/// `{summary: {accuracy}, model_coef, n_rows}`,
/// `{summary: "not enough data", details: {n_rows}}` or
/// `{summary: "error", details: {error}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExperimentResult {
    Fitted {
        summary: AccuracySummary,
        model_coef: Option<Vec<f64>>,
        n_rows: usize,
    },
    NotEnoughData {
        summary: String,
        details: RowCountDetails,
    },
    Failed {
        summary: String,
        details: ErrorDetails,
    },
}

impl ExperimentResult {
    pub const NOT_ENOUGH_DATA: &'static str = "not enough data";
    pub const ERROR: &'static str = "error";

    pub fn not_enough_data(n_rows: usize) -> Self {
        ExperimentResult::NotEnoughData {
            summary: Self::NOT_ENOUGH_DATA.to_string(),
            details: RowCountDetails { n_rows },
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ExperimentResult::Failed {
            summary: Self::ERROR.to_string(),
            details: ErrorDetails {
                error: error.into(),
            },
        }
    }

    /// In-sample accuracy, when a model was fitted
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            ExperimentResult::Fitted { summary, .. } => Some(summary.accuracy),
            _ => None,
        }
    }

    /// The `summary` field as JSON, for log lines
    pub fn summary_value(&self) -> Value {
        match self {
            ExperimentResult::Fitted { summary, .. } => {
                serde_json::json!({ "accuracy": summary.accuracy })
            }
            ExperimentResult::NotEnoughData { summary, .. }
            | ExperimentResult::Failed { summary, .. } => Value::String(summary.clone()),
        }
    }
}

/// Critic verdict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Critique {
    pub critique: String,
    pub confidence: f64,
}

impl Critique {
    pub const FALLBACK_TEXT: &'static str = "Fallback critique";
    pub const DEFAULT_CONFIDENCE: f64 = 0.7;

    pub fn fallback() -> Self {
        Self {
            critique: Self::FALLBACK_TEXT.to_string(),
            confidence: Self::DEFAULT_CONFIDENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_mode_parse() {
        assert_eq!(RunMode::parse("explore"), RunMode::Explore);
        assert_eq!(RunMode::parse("summarize"), RunMode::Summarize);
        assert_eq!(RunMode::parse("simulate"), RunMode::Simulate);
        assert_eq!(RunMode::parse("default"), RunMode::Default);
        assert_eq!(RunMode::parse("EXPLORE"), RunMode::Default);
        assert_eq!(RunMode::parse("bogus"), RunMode::Default);
    }

    #[test]
    fn test_run_mode_round_trips_through_as_str() {
        for mode in RunMode::all() {
            assert_eq!(RunMode::parse(mode.as_str()), *mode);
        }
    }

    #[test]
    fn test_experiment_result_shapes() {
        let fitted = ExperimentResult::Fitted {
            summary: AccuracySummary { accuracy: 0.75 },
            model_coef: Some(vec![1.5]),
            n_rows: 8,
        };
        assert_eq!(
            serde_json::to_value(&fitted).unwrap(),
            json!({"summary": {"accuracy": 0.75}, "model_coef": [1.5], "n_rows": 8})
        );

        assert_eq!(
            serde_json::to_value(ExperimentResult::not_enough_data(2)).unwrap(),
            json!({"summary": "not enough data", "details": {"n_rows": 2}})
        );

        assert_eq!(
            serde_json::to_value(ExperimentResult::failed("boom")).unwrap(),
            json!({"summary": "error", "details": {"error": "boom"}})
        );
    }

    #[test]
    fn test_experiment_result_deserializes_each_shape() {
        let value = json!({"summary": "not enough data", "details": {"n_rows": 1}});
        let parsed: ExperimentResult = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, ExperimentResult::not_enough_data(1));

        let value = json!({"summary": "error", "details": {"error": "x"}});
        let parsed: ExperimentResult = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, ExperimentResult::failed("x"));
    }

    #[test]
    fn test_paper_serializes_abstract_key() {
        let paper = Paper::new("T", "A");
        let value = serde_json::to_value(&paper).unwrap();
        assert_eq!(value["abstract"], "A");
        assert_eq!(value["results"], json!({}));
        assert_eq!(value["critique"], json!({}));
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn test_dataset_failed_shape() {
        let value = serde_json::to_value(Dataset::failed("nope")).unwrap();
        assert_eq!(value, json!({"rows": [], "meta": {"error": "nope"}}));
    }

    #[test]
    fn test_dataset_row_defaults_missing_fields() {
        let row: DatasetRow = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(row.feature, 0.0);
        assert_eq!(row.label, 0);
    }

    #[test]
    fn test_domain_value_round_trips() {
        let domain = Domain::new("Astro", 0.5);
        let value = domain.to_value();
        assert_eq!(value, json!({"name": "Astro", "confidence": 0.5}));
        assert_eq!(serde_json::from_value::<Domain>(value).unwrap(), domain);
    }
}
