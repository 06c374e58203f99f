//! Error types shared by the trajectory driver, the generation clients and
//! the stream encoder.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single simulated year. Any of these ends the run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("LLM API request failed (HTTP {status}): {body}")]
    Upstream { status: u16, body: String },
    #[error("No content received from generation call")]
    NoContent,
    #[error("Generation call timed out after {}", describe_duration(.0))]
    Timeout(Duration),
    #[error("Failed to parse generation response: {0}")]
    MalformedOutcome(String),
    #[error("Generation response out of range: {0}")]
    InvalidOutcome(String),
    #[error("Provider not available: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Http(format!("request timed out: {}", e))
        } else {
            GenerationError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(e: serde_json::Error) -> Self {
        GenerationError::MalformedOutcome(e.to_string())
    }
}

fn describe_duration(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{} seconds", d.as_secs())
    } else {
        format!("{} ms", d.as_millis())
    }
}

/// Failure to push a frame onto the outgoing stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Stream receiver disconnected")]
    Disconnected,
    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for StreamError {
    fn from(e: serde_json::Error) -> Self {
        StreamError::Encode(e.to_string())
    }
}
