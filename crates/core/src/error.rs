//! # Errors
//!
//! Error taxonomy for the service core. Nothing here is retried
//! automatically; upstream failures surface once, at the adapter
//! boundary.

use thiserror::Error;

/// Errors produced by the engine and its collaborators.
#[derive(Debug, Error)]
pub enum StormError {
    /// The service is missing configuration a stage needs.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any failure inside the external pipeline or its backends.
    #[error("upstream pipeline error: {0}")]
    Upstream(String),

    /// A value could not be serialized even after normalization.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The consumer went away; the run stopped early.
    #[error("run cancelled: consumer disconnected")]
    Cancelled,
}

impl From<reqwest::Error> for StormError {
    fn from(err: reqwest::Error) -> Self {
        // Never leak bearer tokens that reqwest may embed in URLs.
        StormError::Upstream(err.without_url().to_string())
    }
}
