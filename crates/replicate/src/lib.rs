//! Replicate prediction client and lifecycle management.
//!
//! Provides the authenticated REST client, typed prediction payloads, the
//! bounded polling loop that drives a prediction to a terminal state, and
//! the output normalizer that turns Replicate's variant output shapes into
//! an ordered list of image URLs.

pub mod api;
pub mod normalize;
pub mod poller;
pub mod prediction;
pub mod service;

pub use api::{PredictionBackend, ReplicateApi, ReplicateApiError};
pub use poller::{PollConfig, PredictionError, Sleeper, TokioSleeper};
pub use prediction::{Prediction, PredictionOutput, PredictionStatus};
pub use service::{GenerationResult, GenerationService};
