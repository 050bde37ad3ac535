//! Signer error types.

use alloy::primitives::Address;
use thiserror::Error;

/// Failure while producing or encoding a signature.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Invalid {field} address {value:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("Payload encoding failed: {0}")]
    Encoding(String),
}

pub type SignerResult<T> = Result<T, SignerError>;

/// Key material problems detected while loading configuration.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid address {0:?}")]
    InvalidAddress(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
