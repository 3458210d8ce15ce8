//! Domain building blocks for the Replicate bridge.
//!
//! Holds the process-wide provider configuration, request coercion rules
//! for image generation, the static model catalog, and the shared
//! [`error::CoreError`] type. Nothing in this crate performs network I/O.

pub mod error;
pub mod generation;
pub mod models;
pub mod provider_config;
