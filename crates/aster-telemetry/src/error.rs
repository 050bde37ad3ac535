//! Telemetry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),

    #[error("Invalid log filter: {0}")]
    Filter(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
