//! Output normalization for finished predictions.

use crate::prediction::{Prediction, PredictionOutput};

/// Collapse a prediction's output into an ordered list of image URLs.
///
/// Order is preserved and empty strings are dropped. An empty result means
/// the prediction finished without producing any image; callers surface
/// that rather than treating it as an error.
pub fn normalize(prediction: &Prediction) -> Vec<String> {
    normalize_output(&prediction.output)
}

/// Same as [`normalize`], operating on the output union directly.
pub fn normalize_output(output: &PredictionOutput) -> Vec<String> {
    match output {
        PredictionOutput::Absent => Vec::new(),
        PredictionOutput::Single(url) if url.is_empty() => Vec::new(),
        PredictionOutput::Single(url) => vec![url.clone()],
        PredictionOutput::Many(urls) => urls.iter().filter(|u| !u.is_empty()).cloned().collect(),
    }
}
