//! Google ID token claim extraction
//!
//! Tokens arrive already validated by the identity provider chain, so only
//! the claims segment is read here. Signature and expiry are not checked.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

/// URL-safe base64 that accepts the claims segment with or without padding
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims decoded from the middle segment of an identity token.
///
/// An undecodable token yields an empty claim set rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityClaims {
    claims: Map<String, Value>,
}

impl IdentityClaims {
    /// Decode the claims segment of `token`.
    ///
    /// Splits on `.`, base64url-decodes the second segment, reads it as UTF-8
    /// and parses a JSON object. Any step failing gives an empty claim set.
    pub fn decode(token: &str) -> Self {
        match decode_segment(token) {
            Some(claims) => Self { claims },
            None => {
                debug!("Identity token claims could not be decoded, using empty claim set");
                Self::default()
            }
        }
    }

    /// `email` claim, if present as a non-empty string
    pub fn email(&self) -> Option<&str> {
        self.string_claim("email")
    }

    /// `name` claim, if present as a non-empty string
    pub fn name(&self) -> Option<&str> {
        self.string_claim("name")
    }

    /// Display name for a new root user: `name`, falling back to `email`
    pub fn display_name(&self) -> Option<&str> {
        self.name().or_else(|| self.email())
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    fn string_claim(&self, key: &str) -> Option<&str> {
        self.claims
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn decode_segment(token: &str) -> Option<Map<String, Value>> {
    let segment = token.split('.').nth(1)?;
    let bytes = CLAIMS_ENGINE.decode(segment).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
