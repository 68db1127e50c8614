//! Token Types
//!
//! Cached token entries and issuer response parsing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AuthError;
use crate::types::config::TokenField;

/// A cached bearer token with its absolute expiry instant.
///
/// Immutable once constructed: a refresh produces a new entry, never
/// mutates an existing one.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenEntry {
    /// The raw token value, attached to requests as `Bearer <token>`.
    pub token: String,
    /// Absolute instant after which the entry is treated as absent.
    pub expires_at: DateTime<Utc>,
}

impl TokenEntry {
    /// Create a new token entry.
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Token value masked for logging.
    pub fn masked(&self) -> String {
        mask_token(&self.token)
    }
}

impl std::fmt::Debug for TokenEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEntry")
            .field("token", &self.masked())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Mask a token value for log output: first 6 and last 4 characters only.
pub fn mask_token(token: &str) -> String {
    let n = token.chars().count();
    if n < 10 {
        return "****".to_string();
    }
    let head: String = token.chars().take(6).collect();
    let tail: String = token.chars().skip(n - 4).collect();
    format!("{}…{}", head, tail)
}

/// Fixed-schema issuer response (RFC 6749 token endpoint).
#[derive(Clone, Debug, Deserialize)]
pub struct StandardTokenResponse {
    /// Access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Declared TTL in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token value and TTL hint extracted from an issuer response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPayload {
    /// The extracted token value.
    pub token: String,
    /// Issuer-declared TTL in seconds, when present.
    pub ttl_secs: Option<u64>,
}

/// Extract the token and TTL hint from an issuer response body, using the
/// strategy selected at startup.
///
/// The token field is the only field whose absence is a hard error; the TTL
/// hint is optional in both strategies.
pub fn parse_token_payload(body: &str, strategy: &TokenField) -> Result<TokenPayload, AuthError> {
    match strategy {
        TokenField::OAuthStandard => {
            let response: StandardTokenResponse =
                serde_json::from_str(body).map_err(|e| AuthError::InvalidResponse {
                    message: e.to_string(),
                })?;
            let token = response
                .access_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AuthError::TokenFieldMissing {
                    field: strategy.field_name().to_string(),
                })?;
            Ok(TokenPayload {
                token,
                ttl_secs: response.expires_in,
            })
        }
        TokenField::Custom(key) => {
            let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)
                .map_err(|e| AuthError::InvalidResponse {
                    message: e.to_string(),
                })?;
            let token = raw
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AuthError::TokenFieldMissing { field: key.clone() })?;
            let ttl_secs = raw.get("expires_in").and_then(|v| v.as_u64());
            Ok(TokenPayload { token, ttl_secs })
        }
    }
}
