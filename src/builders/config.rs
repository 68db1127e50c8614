//! Configuration Builder
//!
//! Fluent builder and validation for `AuthConfig`.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::types::config::{
    AuthConfig, Credential, TokenField, DEFAULT_EXPIRES_IN_MINS, DEFAULT_TIMEOUT,
    DEFAULT_TOKEN_JSON_KEY,
};

/// Authentication configuration builder.
#[derive(Default)]
pub struct AuthConfigBuilder {
    issuer_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    scope: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    expires_in_mins: Option<u64>,
    token_json_key: Option<String>,
    timeout: Option<Duration>,
}

impl AuthConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the issuer (token endpoint) URL.
    pub fn issuer_url(mut self, url: impl Into<String>) -> Self {
        self.issuer_url = Some(url.into());
        self
    }

    /// Set the client ID (client-credentials flavor).
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the client secret (client-credentials flavor).
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set the requested scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set the username (password flavor).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password (password flavor).
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Set the expiry skew in minutes (minimum 1).
    pub fn expires_in_mins(mut self, minutes: u64) -> Self {
        self.expires_in_mins = Some(minutes);
        self
    }

    /// Extract the token via a generic lookup of `key` instead of the fixed
    /// OAuth2 schema. Selecting the strategy without a key uses
    /// `"accessToken"`.
    pub fn token_json_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.token_json_key = Some(if key.is_empty() {
            DEFAULT_TOKEN_JSON_KEY.to_string()
        } else {
            key
        });
        self
    }

    /// Set the HTTP timeout for the authentication exchange.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<AuthConfig, ConfigError> {
        let issuer_url = self.issuer_url.ok_or_else(|| ConfigError::MissingField {
            field: "issuer_url".to_string(),
        })?;
        Url::parse(&issuer_url).map_err(|_| ConfigError::InvalidIssuerUrl {
            url: issuer_url.clone(),
        })?;

        let has_client = self.client_id.is_some() || self.client_secret.is_some();
        let has_password = self.username.is_some() || self.password.is_some();
        let credential = match (has_client, has_password) {
            (true, true) => return Err(ConfigError::ConflictingCredentials),
            (true, false) => Credential::ClientCredentials {
                client_id: self.client_id.ok_or_else(|| ConfigError::MissingField {
                    field: "client_id".to_string(),
                })?,
                client_secret: self.client_secret.ok_or_else(|| {
                    ConfigError::MissingField {
                        field: "client_secret".to_string(),
                    }
                })?,
                scope: self.scope,
            },
            (false, true) => Credential::Password {
                username: self.username.ok_or_else(|| ConfigError::MissingField {
                    field: "username".to_string(),
                })?,
                password: self.password.ok_or_else(|| ConfigError::MissingField {
                    field: "password".to_string(),
                })?,
            },
            (false, false) => {
                return Err(ConfigError::MissingField {
                    field: "credential".to_string(),
                })
            }
        };

        let expires_in_mins = self.expires_in_mins.unwrap_or(DEFAULT_EXPIRES_IN_MINS);
        if expires_in_mins < 1 {
            return Err(ConfigError::InvalidSkew {
                minutes: expires_in_mins,
            });
        }

        let token_field = match self.token_json_key {
            Some(key) => TokenField::Custom(key),
            None => TokenField::OAuthStandard,
        };

        Ok(AuthConfig {
            issuer_url,
            credential,
            expires_in_mins,
            token_field,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// Create an authentication configuration builder.
pub fn auth_config() -> AuthConfigBuilder {
    AuthConfigBuilder::new()
}
