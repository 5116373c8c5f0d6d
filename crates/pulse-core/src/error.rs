//! Error types for Carbon Pulse.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Insufficient history for {building}: need {needed}, have {available}")]
    InsufficientHistory {
        building: String,
        needed: usize,
        available: usize,
    },

    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this failure only affects a single building during a forecast run.
    pub fn is_per_building(&self) -> bool {
        matches!(
            self,
            Error::InsufficientHistory { .. } | Error::MissingArtifact(_) | Error::Inference(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
