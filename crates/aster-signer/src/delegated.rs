//! Delegated-signer ECDSA signing.
//!
//! A secondary key (the "signer") signs orders on behalf of the account
//! address (the "user"). The signed message is built in four fixed steps:
//! 1. Canonical compact JSON of the params (sorted keys, no whitespace)
//! 2. `keccak256(abi.encode(string json, address user, address signer, uint256 nonce))`
//! 3. EIP-191 envelope: `keccak256("\x19Ethereum Signed Message:\n32" || digest)`
//! 4. Recoverable secp256k1 signature, hex `0x || r || s || v` with v in {27, 28}

use std::sync::Arc;

use alloy::primitives::{eip191_hash_message, keccak256, Address, PrimitiveSignature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::SolValue;
use aster_core::CanonicalParams;

use crate::error::{SignerError, SignerResult};
use crate::keys::{parse_address, parse_private_key, KeyManager};
use crate::nonce::NonceManager;
use crate::scheme::{Identity, PayloadSigner, SignedPayload, SigningScheme};

/// ABI-encode `(json, user, signer, nonce)` as a parameter tuple.
///
/// Layout: four head words (string offset `0x80`, two left-padded addresses,
/// big-endian nonce), then the string length word and the UTF-8 bytes
/// right-padded to a 32-byte boundary.
pub fn abi_encode(json: &str, user: Address, signer: Address, nonce: u64) -> Vec<u8> {
    (json.to_string(), user, signer, U256::from(nonce)).abi_encode_params()
}

/// Step 2: message digest over the encoded tuple.
pub fn message_digest(
    params: &CanonicalParams,
    user: Address,
    signer: Address,
    nonce: u64,
) -> B256 {
    keccak256(abi_encode(&params.canonical_json(), user, signer, nonce))
}

/// Step 3: the hash actually signed (personal-sign envelope over the digest).
pub fn signing_hash(digest: B256) -> B256 {
    eip191_hash_message(digest.as_slice())
}

/// `0x`-prefixed 65-byte hex (`r || s || v`, v in {27, 28}).
pub fn signature_hex(signature: &PrimitiveSignature) -> String {
    format!("0x{}", hex::encode(signature.as_bytes()))
}

/// Sign params with an already-loaded key.
pub fn sign_with_key(
    params: &CanonicalParams,
    user: Address,
    signer: Address,
    nonce: u64,
    key: &PrivateKeySigner,
) -> SignerResult<PrimitiveSignature> {
    let digest = message_digest(params, user, signer, nonce);
    let hash = signing_hash(digest);
    // NOTE: Do not log the signature or the key
    Ok(key.sign_hash_sync(&hash)?)
}

/// Sign params from textual key material.
///
/// # Errors
/// Returns `SignerError::InvalidAddress` if `user`/`signer` are not 20-byte
/// hex addresses and `SignerError::InvalidKey` if `private_key` is not a
/// valid 32-byte hex secp256k1 key.
pub fn sign(
    params: &CanonicalParams,
    user: &str,
    signer: &str,
    nonce: u64,
    private_key: &str,
) -> SignerResult<String> {
    let user = address_field("user", user)?;
    let signer = address_field("signer", signer)?;
    let key =
        parse_private_key(private_key).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    let signature = sign_with_key(params, user, signer, nonce, &key)?;
    Ok(signature_hex(&signature))
}

fn address_field(field: &'static str, value: &str) -> SignerResult<Address> {
    parse_address(value).map_err(|e| SignerError::InvalidAddress {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Delegated signer with its own nonce allocator.
#[derive(Debug)]
pub struct DelegatedSigner {
    key_manager: Arc<KeyManager>,
    user: Address,
    nonces: NonceManager,
}

impl DelegatedSigner {
    /// `signer` address is the one derived from the key manager.
    pub fn new(key_manager: Arc<KeyManager>, user: Address, nonces: NonceManager) -> Self {
        Self {
            key_manager,
            user,
            nonces,
        }
    }

    pub fn signer_address(&self) -> Address {
        self.key_manager.address()
    }

    /// Sign with an explicit nonce (bypasses the allocator).
    pub fn sign_with_nonce(
        &self,
        params: CanonicalParams,
        nonce: u64,
    ) -> SignerResult<SignedPayload> {
        let signer = self.signer_address();
        let signature =
            sign_with_key(&params, self.user, signer, nonce, self.key_manager.signer())?;

        tracing::debug!(user = %self.user, %signer, nonce, "Signed delegated order");

        Ok(SignedPayload::new(
            params,
            signature_hex(&signature),
            Identity::Delegated {
                user: self.user,
                signer,
                nonce,
            },
        ))
    }
}

impl PayloadSigner for DelegatedSigner {
    fn scheme(&self) -> SigningScheme {
        SigningScheme::Delegated
    }

    fn sign(&self, params: CanonicalParams) -> SignerResult<SignedPayload> {
        let nonce = self.nonces.next();
        self.sign_with_nonce(params, nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::SharedClock;
    use aster_core::FixedClock;
    use std::collections::HashSet;
    use std::thread;

    // Well-known test private key (DO NOT use in production)
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_SIGNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const TEST_USER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const NONCE: u64 = 1_700_000_000_000_000;

    fn fixture_params() -> CanonicalParams {
        [
            ("symbol", "BTCUSDT"),
            ("side", "BUY"),
            ("type", "MARKET"),
            ("quantity", "0.01"),
            ("recvWindow", "50000"),
            ("timestamp", "1700000000000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn test_signer() -> DelegatedSigner {
        let key_manager =
            KeyManager::from_bytes(&hex::decode(&TEST_PRIVATE_KEY[2..]).unwrap()).unwrap();
        let clock: SharedClock = Arc::new(FixedClock::from_micros(NONCE));
        DelegatedSigner::new(
            Arc::new(key_manager),
            parse_address(TEST_USER).unwrap(),
            NonceManager::new(clock),
        )
    }

    #[test]
    fn test_abi_layout() {
        let json = r#"{"a":"1"}"#;
        let user = Address::repeat_byte(0x11);
        let signer = Address::repeat_byte(0x22);
        let encoded = abi_encode(json, user, signer, 7);

        // 4 head words + length word + one padded data word
        assert_eq!(encoded.len(), 6 * 32);
        assert_eq!(U256::from_be_slice(&encoded[0..32]), U256::from(0x80));
        assert_eq!(&encoded[32..44], &[0u8; 12]);
        assert_eq!(&encoded[44..64], user.as_slice());
        assert_eq!(&encoded[76..96], signer.as_slice());
        assert_eq!(U256::from_be_slice(&encoded[96..128]), U256::from(7));
        assert_eq!(U256::from_be_slice(&encoded[128..160]), U256::from(json.len()));
        assert_eq!(&encoded[160..160 + json.len()], json.as_bytes());
        assert!(encoded[160 + json.len()..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_signing_hash_is_personal_sign_envelope() {
        let digest = B256::repeat_byte(0xab);
        let mut envelope = b"\x19Ethereum Signed Message:\n32".to_vec();
        envelope.extend_from_slice(digest.as_slice());
        assert_eq!(signing_hash(digest), keccak256(&envelope));
    }

    #[test]
    fn test_signature_recovers_to_signer() {
        let params = fixture_params();
        let user = parse_address(TEST_USER).unwrap();
        let signer = parse_address(TEST_SIGNER).unwrap();

        let sig_hex = sign(&params, TEST_USER, TEST_SIGNER, NONCE, TEST_PRIVATE_KEY).unwrap();
        assert!(sig_hex.starts_with("0x"));
        assert_eq!(sig_hex.len(), 2 + 65 * 2);

        let bytes = hex::decode(&sig_hex[2..]).unwrap();
        assert!(bytes[64] == 27 || bytes[64] == 28);

        // Rebuild the hash independently and recover.
        let digest = keccak256(abi_encode(&params.canonical_json(), user, signer, NONCE));
        let hash = signing_hash(digest);
        let signature = PrimitiveSignature::try_from(bytes.as_slice()).unwrap();
        let recovered = signature.recover_address_from_prehash(&hash).unwrap();

        assert_eq!(recovered, signer);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let params = fixture_params();
        let a = sign(&params, TEST_USER, TEST_SIGNER, NONCE, TEST_PRIVATE_KEY).unwrap();
        let b = sign(&params, TEST_USER, TEST_SIGNER, NONCE, TEST_PRIVATE_KEY).unwrap();
        assert_eq!(a, b);

        let c = sign(&params, TEST_USER, TEST_SIGNER, NONCE + 1, TEST_PRIVATE_KEY).unwrap();
        assert_ne!(a, c, "nonce must be part of the signed message");
    }

    #[test]
    fn test_malformed_key_rejected() {
        let params = fixture_params();
        for key in ["", "0x1234", "zz", &TEST_PRIVATE_KEY[..40]] {
            let err = sign(&params, TEST_USER, TEST_SIGNER, NONCE, key).unwrap_err();
            assert!(matches!(err, SignerError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        let params = fixture_params();
        let err = sign(&params, "0x1234", TEST_SIGNER, NONCE, TEST_PRIVATE_KEY).unwrap_err();
        assert!(matches!(err, SignerError::InvalidAddress { field: "user", .. }));

        let err = sign(&params, TEST_USER, "signer", NONCE, TEST_PRIVATE_KEY).unwrap_err();
        assert!(matches!(err, SignerError::InvalidAddress { field: "signer", .. }));
    }

    #[test]
    fn test_delegated_signer_payload_identity() {
        let signer = test_signer();
        let signed = signer.sign(fixture_params()).unwrap();

        assert_eq!(signer.scheme(), SigningScheme::Delegated);
        match signed.identity() {
            Identity::Delegated {
                user,
                signer: signer_addr,
                nonce,
            } => {
                assert_eq!(*user, parse_address(TEST_USER).unwrap());
                assert_eq!(*signer_addr, parse_address(TEST_SIGNER).unwrap());
                assert_eq!(*nonce, NONCE + 1);
            }
            other => panic!("unexpected identity {other:?}"),
        }
    }

    #[test]
    fn test_parallel_signing_never_reuses_nonce() {
        // Frozen clock: every request lands in the same microsecond.
        let signer = Arc::new(test_signer());
        let threads = 8;
        let per_thread = 125;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let signer = Arc::clone(&signer);
                thread::spawn(move || {
                    (0..per_thread)
                        .map(|_| match signer.sign(fixture_params()).unwrap().identity() {
                            Identity::Delegated { nonce, .. } => *nonce,
                            Identity::ApiKey(_) => unreachable!(),
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let nonces: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<u64> = nonces.iter().copied().collect();

        assert_eq!(nonces.len(), threads * per_thread);
        assert_eq!(unique.len(), nonces.len(), "nonces must be unique");
    }
}
