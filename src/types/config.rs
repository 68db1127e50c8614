//! Configuration Types
//!
//! Immutable credential and issuer configuration, loaded once at startup.

use secrecy::SecretString;
use std::time::Duration;

/// Default expiry skew in minutes.
pub const DEFAULT_EXPIRES_IN_MINS: u64 = 30;

/// Default response key for the generic token-extraction strategy.
pub const DEFAULT_TOKEN_JSON_KEY: &str = "accessToken";

/// Default HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication configuration for one credential.
#[derive(Clone)]
pub struct AuthConfig {
    /// Issuer (token endpoint) URL.
    pub issuer_url: String,
    /// The credential exchanged for bearer tokens.
    pub credential: Credential,
    /// Expiry skew in minutes, subtracted from the issuer-declared TTL.
    /// Minimum 1, enforced by the builder.
    pub expires_in_mins: u64,
    /// Response-parsing strategy for the token field.
    pub token_field: TokenField,
    /// HTTP timeout for the authentication exchange.
    pub timeout: Duration,
}

impl AuthConfig {
    /// Expiry skew converted to seconds, the unit issuers declare TTLs in.
    pub fn skew_secs(&self) -> u64 {
        self.expires_in_mins * 60
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer_url", &self.issuer_url)
            .field("credential", &self.credential)
            .field("expires_in_mins", &self.expires_in_mins)
            .field("token_field", &self.token_field)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Credential flavor exchanged at the issuer.
#[derive(Clone)]
pub enum Credential {
    /// OAuth2 client-credentials grant, sent form-urlencoded.
    ClientCredentials {
        client_id: String,
        client_secret: SecretString,
        scope: Option<String>,
    },
    /// Username/password exchange, sent as a JSON body.
    Password {
        username: String,
        password: SecretString,
    },
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientCredentials { client_id, scope, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("scope", scope)
                .finish(),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Response-parsing strategy for extracting the token, selected by
/// configuration at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenField {
    /// Fixed OAuth2 schema: `access_token`, `token_type`, `expires_in`,
    /// `scope`.
    OAuthStandard,
    /// Generic lookup of a configured key in the response object.
    Custom(String),
}

impl TokenField {
    /// Name of the field the token is extracted from.
    pub fn field_name(&self) -> &str {
        match self {
            Self::OAuthStandard => "access_token",
            Self::Custom(key) => key.as_str(),
        }
    }
}

impl Default for TokenField {
    fn default() -> Self {
        Self::OAuthStandard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skew_converts_minutes_to_seconds() {
        let config = AuthConfig {
            issuer_url: "https://issuer.example.com/token".to_string(),
            credential: Credential::Password {
                username: "u".to_string(),
                password: SecretString::new("p".to_string()),
            },
            expires_in_mins: 5,
            token_field: TokenField::default(),
            timeout: DEFAULT_TIMEOUT,
        };
        assert_eq!(config.skew_secs(), 300);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::ClientCredentials {
            client_id: "my-client".to_string(),
            client_secret: SecretString::new("s3cret".to_string()),
            scope: Some("api".to_string()),
        };
        let rendered = format!("{:?}", credential);
        assert!(rendered.contains("my-client"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_token_field_names() {
        assert_eq!(TokenField::OAuthStandard.field_name(), "access_token");
        assert_eq!(
            TokenField::Custom("accessToken".to_string()).field_name(),
            "accessToken"
        );
    }
}
