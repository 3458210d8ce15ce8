//! Image generation request parsing and Replicate input construction.
//!
//! Clients send loosely typed JSON (numbers may arrive as strings, fields
//! may be missing or junk). [`GenerationRequest::prepare`] turns that into a
//! [`PreparedGeneration`] whose `input` map carries only the fields that
//! coerced cleanly, so Replicate's own defaults apply to everything else.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

use crate::error::CoreError;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Optional numeric inputs. Request field names match Replicate input keys.
const NUMERIC_INPUTS: [&str; 5] = [
    "width",
    "height",
    "num_outputs",
    "guidance_scale",
    "num_inference_steps",
];

/// Body of `POST /generate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(default)]
    pub width: Option<Value>,
    #[serde(default)]
    pub height: Option<Value>,
    #[serde(default)]
    pub num_outputs: Option<Value>,
    #[serde(default)]
    pub guidance_scale: Option<Value>,
    #[serde(default)]
    pub num_inference_steps: Option<Value>,
}

/// A validated request ready to be submitted as a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedGeneration {
    /// Trimmed, non-empty prompt.
    pub prompt: String,
    /// Effective model id (request model or configured default).
    pub model: String,
    /// Replicate `input` object. Always contains `prompt`.
    pub input: Map<String, Value>,
}

impl GenerationRequest {
    /// A request carrying only a prompt.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    /// Validate the prompt, resolve the model, and build the input map.
    ///
    /// Fails with [`CoreError::Validation`] when the prompt is missing or
    /// blank.
    pub fn prepare(&self, default_model: &str) -> Result<PreparedGeneration, CoreError> {
        let prompt = self
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::Validation("Prompt is required".to_string()))?
            .to_string();

        let model = resolve_model(self.model.as_deref(), default_model);

        let mut input = Map::new();
        input.insert("prompt".to_string(), Value::String(prompt.clone()));

        let values = [
            &self.width,
            &self.height,
            &self.num_outputs,
            &self.guidance_scale,
            &self.num_inference_steps,
        ];
        for (key, value) in NUMERIC_INPUTS.iter().zip(values) {
            if let Some(number) = value.as_ref().and_then(coerce_number) {
                input.insert((*key).to_string(), Value::Number(number));
            }
        }

        Ok(PreparedGeneration {
            prompt,
            model,
            input,
        })
    }
}

/// Pick the requested model when it is non-blank, else the default.
pub fn resolve_model(requested: Option<&str>, default_model: &str) -> String {
    requested
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default_model)
        .to_string()
}

/// Coerce a loosely typed JSON value into a finite number.
///
/// Accepts numbers and numeric strings. Blank strings, non-finite values,
/// and every other JSON type yield `None`. Integral values come back as
/// JSON integers so `1024` is not forwarded as `1024.0`.
pub fn coerce_number(value: &Value) -> Option<Number> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if !parsed.is_finite() {
        return None;
    }

    if parsed.fract() == 0.0 && parsed.abs() <= MAX_EXACT_INTEGER {
        Some(Number::from(parsed as i64))
    } else {
        Number::from_f64(parsed)
    }
}

/// Deserialize a field as `Some(string)` only when it is a JSON string.
///
/// Any other JSON type becomes `None` instead of failing the whole body.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
