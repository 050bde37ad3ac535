//! Error types for aster-core.

use thiserror::Error;

/// Rejection of an inbound order intent.
///
/// Always a client-side problem: the relay maps every variant to HTTP 400.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Order intent must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("LIMIT order requires price")]
    LimitWithoutPrice,

    #[error("Reserved field not allowed in order intent: {0}")]
    ReservedField(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ValidationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, ValidationError>;
