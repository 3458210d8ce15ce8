//! Request handlers for the Replicate bridge.
//!
//! Handlers stay thin: they read the provider snapshot, delegate to
//! `rbridge_core` / `rbridge_replicate`, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod config;
pub mod generation;
pub mod models;
pub mod predictions;
