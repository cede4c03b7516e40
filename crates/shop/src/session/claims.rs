//! Decoding of bearer token claims.
//!
//! Tokens are compact three-segment JWTs (`header.payload.signature`). Only
//! the payload is read; the signature is the backend's concern.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// base64url, accepting payloads with or without `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a token cannot be decoded.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),

    #[error("token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload is not a valid claims object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Claims carried in a session token's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch. Fractional values are floored.
    #[serde(deserialize_with = "seconds")]
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Every other claim, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Whether `exp` lies strictly after `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.exp > now.timestamp()
    }

    /// Expiry as a timestamp, if representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// The user identifier, from `id`, `_id`, or `sub` (string or number).
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        ["id", "_id", "sub"]
            .iter()
            .find_map(|key| match self.extra.get(*key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Whole or fractional epoch seconds, floored to whole seconds.
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Whole(i64),
        Fractional(f64),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Whole(secs) => Ok(secs),
        #[allow(clippy::cast_possible_truncation)]
        Seconds::Fractional(secs) if secs.is_finite() && secs.abs() < 1e15 => {
            Ok(secs.floor() as i64)
        }
        Seconds::Fractional(secs) => Err(serde::de::Error::custom(format!(
            "exp out of range: {secs}"
        ))),
    }
}

/// Decode the claims of a compact token without verifying its signature.
///
/// # Errors
///
/// Returns [`TokenError`] if the token is not three segments, the payload is
/// not base64url, or the JSON lacks a numeric `exp`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(TokenError::Segments(segments.len()));
    };

    let bytes = PAYLOAD_ENGINE.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}
