//! Wire assembly: signed payload -> `application/x-www-form-urlencoded` body.

use crate::error::{SignerError, SignerResult};
use crate::scheme::{Identity, SignedPayload};

/// Content type of every order request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Header carrying the API key for the HMAC scheme.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Ready-to-send order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    /// Form-encoded body.
    pub body: String,
    pub content_type: &'static str,
    /// Value for [`API_KEY_HEADER`]; `None` for the delegated scheme.
    pub api_key: Option<String>,
}

impl WireRequest {
    /// Header pair to attach, if the scheme needs one.
    pub fn api_key_header(&self) -> Option<(&'static str, &str)> {
        self.api_key.as_deref().map(|key| (API_KEY_HEADER, key))
    }
}

/// Merge params with the signature fields and form-encode the result.
///
/// Field order: canonical params (sorted), then `nonce`/`user`/`signer` for
/// the delegated scheme, then `signature` last. Keeping the params first
/// means the body prefix matches the signed query string whenever no value
/// needs percent-encoding.
pub fn assemble(signed: &SignedPayload) -> SignerResult<WireRequest> {
    let mut fields: Vec<(&str, String)> = signed
        .params()
        .iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();

    let api_key = match signed.identity() {
        Identity::ApiKey(key) => Some(key.clone()),
        Identity::Delegated {
            user,
            signer,
            nonce,
        } => {
            fields.push(("nonce", nonce.to_string()));
            fields.push(("user", user.to_string()));
            fields.push(("signer", signer.to_string()));
            None
        }
    };
    fields.push(("signature", signed.signature().to_string()));

    let body =
        serde_urlencoded::to_string(&fields).map_err(|e| SignerError::Encoding(e.to_string()))?;

    Ok(WireRequest {
        body,
        content_type: FORM_CONTENT_TYPE,
        api_key,
    })
}
