//! Secret and key material.
//!
//! Security notes:
//! - Secrets are wrapped in `Zeroizing` and never printed by `Debug`.
//! - Keys are loaded once at startup; no runtime key rotation.
//! - Never log private key material.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

use crate::error::KeyError;

/// String secret (API secret) that is wiped on drop and redacted in logs.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Access the raw secret. Keep the borrow short.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(REDACTED)")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Source of the signer private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Hex key read from the named environment variable.
    EnvVar { var_name: String },
    /// Hex key read from a file; keep it mode 0600.
    File { path: PathBuf },
    /// Hex string already in memory (tests, config-injected secrets).
    Inline(SecretString),
}

/// Parse a 20-byte hex address (`0x` prefix optional, checksum not enforced).
pub fn parse_address(text: &str) -> Result<Address, KeyError> {
    Address::from_str(text.trim()).map_err(|_| KeyError::InvalidAddress(text.to_string()))
}

/// Parse a hex private key (supports 0x prefix and whitespace trimming).
pub(crate) fn parse_private_key(hex_str: &str) -> Result<PrivateKeySigner, KeyError> {
    let trimmed = hex_str.trim().trim_start_matches("0x");
    let secret_bytes = Zeroizing::new(hex::decode(trimmed)?);
    PrivateKeySigner::from_slice(&secret_bytes).map_err(|e| KeyError::InvalidKey(e.to_string()))
}

/// Holds the delegated signer key.
pub struct KeyManager {
    signer: PrivateKeySigner,
}

impl KeyManager {
    /// Read the key from `source`.
    ///
    /// When `expected_signer` is given, the address derived from the key must
    /// equal it; a mismatch means the configuration points at the wrong key.
    pub fn load(source: KeySource, expected_signer: Option<Address>) -> Result<Self, KeyError> {
        let signer = match source {
            KeySource::EnvVar { ref var_name } => {
                let hex = Zeroizing::new(
                    std::env::var(var_name)
                        .map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
                );
                parse_private_key(&hex)?
            }
            KeySource::File { ref path } => {
                let content = Zeroizing::new(std::fs::read_to_string(path)?);
                parse_private_key(&content)?
            }
            KeySource::Inline(ref secret) => parse_private_key(secret.expose())?,
        };

        if let Some(expected) = expected_signer {
            let derived = signer.address();
            if derived != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: derived,
                });
            }
        }

        Ok(Self { signer })
    }

    /// Load from raw bytes (no environment dependency).
    pub fn from_bytes(secret_bytes: &[u8]) -> Result<Self, KeyError> {
        let signer = PrivateKeySigner::from_slice(secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(Self { signer })
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Address derived from the private key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardhat account #0.
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_inline_key_derives_known_address() {
        let manager =
            KeyManager::load(KeySource::Inline(TEST_PRIVATE_KEY.into()), None).unwrap();
        assert_eq!(manager.address(), parse_address(TEST_ADDRESS).unwrap());
    }

    #[test]
    fn test_address_mismatch() {
        let result = KeyManager::load(
            KeySource::Inline(TEST_PRIVATE_KEY.into()),
            Some(Address::ZERO),
        );
        assert!(matches!(result, Err(KeyError::AddressMismatch { .. })));
    }

    #[test]
    fn test_missing_env_var() {
        let result = KeyManager::load(
            KeySource::EnvVar {
                var_name: "ASTER_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            },
            None,
        );
        assert!(matches!(result, Err(KeyError::EnvVarNotFound(_))));
    }

    #[test]
    fn test_malformed_keys_rejected() {
        assert!(matches!(
            parse_private_key("0xnothex"),
            Err(KeyError::HexDecode(_))
        ));
        assert!(matches!(
            parse_private_key("0xabcd"),
            Err(KeyError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_parse_address_accepts_lowercase_and_rejects_short() {
        assert!(parse_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").is_ok());
        assert!(parse_address("f39fd6e51aad88f6f4ce6ab8827279cfffb92266").is_ok());
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = SecretString::new("hunter2");
        assert_eq!(format!("{secret:?}"), "SecretString(REDACTED)");
        assert_eq!(secret.expose(), "hunter2");
    }
}
