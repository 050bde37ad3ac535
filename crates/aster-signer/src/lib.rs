//! Order signing and wire assembly for the Aster futures API.
//!
//! # Key Components
//!
//! - [`hmac`]: HMAC-SHA256 over the sorted, unencoded query string
//! - [`delegated`]: ABI-encode + Keccak + EIP-191 + secp256k1 with a delegated key
//! - [`NonceManager`]: unique microsecond nonces for the delegated scheme
//! - [`RequestSigner`]: the scheme chosen at startup, behind [`PayloadSigner`]
//! - [`assemble`]: merge signature fields and form-encode the body

pub mod assembler;
pub mod delegated;
pub mod error;
pub mod hmac;
pub mod keys;
pub mod nonce;
pub mod scheme;

pub use crate::assembler::{assemble, WireRequest, API_KEY_HEADER, FORM_CONTENT_TYPE};
pub use crate::delegated::DelegatedSigner;
pub use crate::error::{KeyError, SignerError, SignerResult};
pub use crate::hmac::HmacSigner;
pub use crate::keys::{parse_address, KeyManager, KeySource, SecretString};
pub use crate::nonce::{NonceManager, SharedClock};
pub use crate::scheme::{Identity, PayloadSigner, RequestSigner, SignedPayload, SigningScheme};
