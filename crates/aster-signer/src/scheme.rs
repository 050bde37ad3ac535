//! Signing strategy selected once at startup.

use std::fmt;

use alloy::primitives::Address;
use aster_core::CanonicalParams;
use serde::{Deserialize, Serialize};

use crate::delegated::DelegatedSigner;
use crate::error::SignerResult;
use crate::hmac::HmacSigner;

/// Which authentication scheme the exchange endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
    /// API key header + HMAC-SHA256 `signature`.
    #[default]
    Hmac,
    /// `user`/`signer`/`nonce` + secp256k1 `signature` from a delegated key.
    Delegated,
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hmac => write!(f, "hmac"),
            Self::Delegated => write!(f, "delegated"),
        }
    }
}

/// Identity material that accompanies a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Sent as the `X-MBX-APIKEY` header, not in the body.
    ApiKey(String),
    /// Sent in the body as `user`, `signer`, `nonce`.
    Delegated {
        user: Address,
        signer: Address,
        nonce: u64,
    },
}

/// Canonical params plus the signature over them. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    params: CanonicalParams,
    signature: String,
    identity: Identity,
}

impl SignedPayload {
    pub fn new(params: CanonicalParams, signature: String, identity: Identity) -> Self {
        Self {
            params,
            signature,
            identity,
        }
    }

    pub fn params(&self) -> &CanonicalParams {
        &self.params
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Common interface of both signing schemes.
pub trait PayloadSigner: Send + Sync {
    fn scheme(&self) -> SigningScheme;

    /// Sign canonical params, returning them together with the signature
    /// fields the assembler needs.
    fn sign(&self, params: CanonicalParams) -> SignerResult<SignedPayload>;
}

/// The configured signer. Built once from configuration and shared.
#[derive(Debug)]
pub enum RequestSigner {
    Hmac(HmacSigner),
    Delegated(DelegatedSigner),
}

impl PayloadSigner for RequestSigner {
    fn scheme(&self) -> SigningScheme {
        match self {
            Self::Hmac(s) => s.scheme(),
            Self::Delegated(s) => s.scheme(),
        }
    }

    fn sign(&self, params: CanonicalParams) -> SignerResult<SignedPayload> {
        match self {
            Self::Hmac(s) => s.sign(params),
            Self::Delegated(s) => s.sign(params),
        }
    }
}

impl From<HmacSigner> for RequestSigner {
    fn from(signer: HmacSigner) -> Self {
        Self::Hmac(signer)
    }
}

impl From<DelegatedSigner> for RequestSigner {
    fn from(signer: DelegatedSigner) -> Self {
        Self::Delegated(signer)
    }
}
