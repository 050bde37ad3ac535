//! HMAC-SHA256 signing for API-key authenticated orders.

use std::fmt;

use aster_core::CanonicalParams;
use ::hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{SignerError, SignerResult};
use crate::keys::SecretString;
use crate::scheme::{Identity, PayloadSigner, SignedPayload, SigningScheme};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over `message`, keyed with the UTF-8 bytes of `secret`.
/// Output is lowercase hex.
pub fn sign_query(message: &str, secret: &str) -> SignerResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign the sorted, unencoded query string of `params`.
pub fn sign_params(params: &CanonicalParams, secret: &str) -> SignerResult<String> {
    sign_query(&params.query_string(), secret)
}

/// Shared-secret signer (`X-MBX-APIKEY` + `signature` scheme).
#[derive(Clone)]
pub struct HmacSigner {
    api_key: String,
    api_secret: SecretString,
}

impl HmacSigner {
    pub fn new(api_key: impl Into<String>, api_secret: SecretString) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret,
        }
    }

}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("api_key", &"REDACTED")
            .finish_non_exhaustive()
    }
}

impl PayloadSigner for HmacSigner {
    fn scheme(&self) -> SigningScheme {
        SigningScheme::Hmac
    }

    fn sign(&self, params: CanonicalParams) -> SignerResult<SignedPayload> {
        let signature = sign_params(&params, self.api_secret.expose())?;
        Ok(SignedPayload::new(
            params,
            signature,
            Identity::ApiKey(self.api_key.clone()),
        ))
    }
}
