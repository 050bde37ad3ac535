//! Application error types.
//!
//! Every failure keeps its origin so the HTTP response can tell a local
//! problem (validation, configuration, signing) from an exchange rejection
//! or an unreachable exchange.

use aster_core::ValidationError;
use aster_signer::{KeyError, SignerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Exchange unreachable: {0}")]
    ExchangeUnreachable(String),

    #[error("Non-JSON response from exchange (HTTP {status})")]
    NonJsonResponse { status: u16, text: String },

    #[error("Order rejected by exchange (HTTP {status})")]
    OrderRejected {
        status: u16,
        detail: serde_json::Value,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// HTTP status the webhook caller receives for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidJson(_) | Self::Validation(_) => 400,
            Self::Config(_) | Self::Signer(_) | Self::Key(_) | Self::Io(_) => 500,
            Self::ExchangeUnreachable(_) => 502,
            Self::NonJsonResponse { status, .. } | Self::OrderRejected { status, .. } => *status,
        }
    }

    /// Whether the failure happened before anything was sent.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            Self::ExchangeUnreachable(_) | Self::NonJsonResponse { .. } | Self::OrderRejected { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
