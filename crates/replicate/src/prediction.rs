//! Typed view of a Replicate prediction.
//!
//! Replicate owns the status vocabulary and the output shape, so both are
//! decoded leniently: unknown statuses are kept as [`PredictionStatus::Other`]
//! and output is folded into the three-way [`PredictionOutput`] union. The
//! untouched JSON is kept in [`Prediction::raw`] for pass-through endpoints.

use serde::Deserialize;
use serde_json::Value;

/// Lifecycle status reported by Replicate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum PredictionStatus {
    #[default]
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Any status this client does not know about yet.
    Other(String),
}

impl PredictionStatus {
    /// Whether the prediction will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PredictionStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "starting" => Self::Starting,
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Other(value),
        }
    }
}

/// The shapes Replicate uses for the `output` field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum PredictionOutput {
    /// `null`, missing, or a shape that carries no image references.
    #[default]
    Absent,
    /// A single URL.
    Single(String),
    /// An ordered list of URLs. Non-string elements are dropped on decode.
    Many(Vec<String>),
}

impl From<Value> for PredictionOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Single(s),
            Value::Array(items) => Self::Many(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Self::Absent,
        }
    }
}

/// A Replicate prediction as returned by create, get, and cancel.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: PredictionOutput,
    /// Failure detail; Replicate sends a string but may send `null` or an object.
    #[serde(default)]
    pub error: Option<Value>,
    /// The response body exactly as received.
    #[serde(skip)]
    pub raw: Value,
}

impl Prediction {
    /// Decode a prediction, keeping the original JSON alongside.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut prediction = Self::deserialize(&value)?;
        prediction.raw = value;
        Ok(prediction)
    }

    /// Human-readable failure detail, if Replicate supplied one.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
