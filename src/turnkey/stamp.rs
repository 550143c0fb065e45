//! API key request stamping
//!
//! Every Turnkey API request carries an `X-Stamp` header proving possession
//! of the API private key:
//!
//! 1. Sign the exact request body bytes with ECDSA P-256 / SHA-256
//! 2. DER-encode the signature and hex it
//! 3. Serialize `{publicKey, scheme, signature}` as JSON
//! 4. base64url-encode the JSON without padding

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::traits::ProviderError;

/// Header carrying the request stamp
pub const STAMP_HEADER: &str = "X-Stamp";

/// Signature scheme identifier for P-256 API keys
pub const STAMP_SCHEME: &str = "SIGNATURE_SCHEME_TK_API_P256";

/// Decoded stamp payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamp {
    pub public_key: String,
    pub scheme: String,
    pub signature: String,
}

/// Signs request bodies with a Turnkey API key.
pub struct ApiKeyStamper {
    signing_key: SigningKey,
    public_key: String,
}

impl ApiKeyStamper {
    /// Build a stamper from a hex private key and its hex public key.
    pub fn new(private_key_hex: &str, public_key_hex: impl Into<String>) -> Result<Self, ProviderError> {
        let bytes = Zeroizing::new(
            hex::decode(private_key_hex.trim())
                .map_err(|e| ProviderError::Stamp(format!("API private key is not hex: {}", e)))?,
        );
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| ProviderError::Stamp(format!("Invalid P-256 private key: {}", e)))?;

        Ok(Self {
            signing_key,
            public_key: public_key_hex.into(),
        })
    }

    /// Produce the `X-Stamp` header value for `body`.
    pub fn stamp(&self, body: &[u8]) -> Result<String, ProviderError> {
        let signature: Signature = self
            .signing_key
            .try_sign(body)
            .map_err(|e| ProviderError::Stamp(format!("Signing failed: {}", e)))?;

        let stamp = Stamp {
            public_key: self.public_key.clone(),
            scheme: STAMP_SCHEME.to_string(),
            signature: hex::encode(signature.to_der().as_bytes()),
        };

        let json = serde_json::to_vec(&stamp)
            .map_err(|e| ProviderError::Stamp(format!("Stamp serialization failed: {}", e)))?;

        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

/// Decode an `X-Stamp` header value back into its payload.
pub fn decode_stamp(header_value: &str) -> Option<Stamp> {
    let json = URL_SAFE_NO_PAD.decode(header_value).ok()?;
    serde_json::from_slice(&json).ok()
}
