//! Token Issuer Client
//!
//! Performs the authentication exchange against the issuer and parses the
//! response into a cacheable token entry. Fetch only: storing the result is
//! the controller's job.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{HttpMethod, HttpRequest, HttpTransport, RequestBody};
use crate::error::AuthError;
use crate::types::config::{AuthConfig, Credential};
use crate::types::token::{parse_token_payload, TokenEntry};

/// Minimal TTL in seconds, used when the issuer declares no TTL or one not
/// greater than the configured skew. Never zero or negative.
pub const FALLBACK_TTL_SECS: u64 = 60;

/// Token issuer interface.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Perform one authentication exchange.
    async fn authenticate(&self) -> Result<TokenEntry, AuthError>;
}

/// HTTP token issuer implementation.
pub struct HttpTokenIssuer<T: HttpTransport> {
    config: Arc<AuthConfig>,
    transport: Arc<T>,
}

impl<T: HttpTransport> HttpTokenIssuer<T> {
    /// Create new issuer client.
    pub fn new(config: Arc<AuthConfig>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    fn build_request(&self) -> HttpRequest {
        let body = match &self.config.credential {
            Credential::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => {
                let mut params = vec![
                    ("grant_type".to_string(), "client_credentials".to_string()),
                    ("client_id".to_string(), client_id.clone()),
                    (
                        "client_secret".to_string(),
                        client_secret.expose_secret().to_string(),
                    ),
                ];
                if let Some(scope) = scope.as_ref().filter(|s| !s.trim().is_empty()) {
                    params.push(("scope".to_string(), scope.clone()));
                }
                RequestBody::Form(params)
            }
            Credential::Password { username, password } => {
                RequestBody::Json(serde_json::json!({
                    "username": username,
                    "password": password.expose_secret(),
                    "expiresInMins": self.config.expires_in_mins,
                }))
            }
        };

        HttpRequest::new(HttpMethod::Post, self.config.issuer_url.clone())
            .header("accept", "application/json")
            .body(body)
            .timeout(self.config.timeout)
    }

    /// Effective TTL: issuer-declared TTL minus the configured skew when the
    /// declared value exceeds the skew, otherwise the fallback floor.
    fn effective_ttl_secs(&self, declared: Option<u64>) -> u64 {
        let skew = self.config.skew_secs();
        match declared {
            Some(d) if d > skew => d - skew,
            _ => FALLBACK_TTL_SECS,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> TokenIssuer for HttpTokenIssuer<T> {
    async fn authenticate(&self) -> Result<TokenEntry, AuthError> {
        let response = self.transport.send(self.build_request()).await?;

        if !response.is_success() {
            debug!(
                status = response.status,
                "issuer rejected the authentication exchange"
            );
            return Err(AuthError::IssuerRejected {
                status: response.status,
                body: response.body,
            });
        }

        let payload = parse_token_payload(&response.body, &self.config.token_field)?;
        let ttl_secs = self.effective_ttl_secs(payload.ttl_secs);
        let entry = TokenEntry::new(
            payload.token,
            Utc::now() + Duration::seconds(ttl_secs as i64),
        );

        info!(
            token = %entry.masked(),
            ttl_secs,
            "authentication exchange succeeded"
        );
        Ok(entry)
    }
}

/// Mock token issuer for testing.
#[derive(Default)]
pub struct MockTokenIssuer {
    results: std::sync::Mutex<VecDeque<Result<TokenEntry, AuthError>>>,
    call_count: std::sync::atomic::AtomicUsize,
    delay: std::sync::Mutex<Option<std::time::Duration>>,
}

impl MockTokenIssuer {
    /// Create new mock issuer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a token to return, valid for `ttl_secs` from now.
    pub fn queue_token(&self, token: &str, ttl_secs: i64) -> &Self {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(TokenEntry::new(
                token.to_string(),
                Utc::now() + Duration::seconds(ttl_secs),
            )));
        self
    }

    /// Queue an error to return.
    pub fn queue_error(&self, error: AuthError) -> &Self {
        self.results.lock().unwrap().push_back(Err(error));
        self
    }

    /// Delay each exchange, to widen the in-flight window in concurrency
    /// tests.
    pub fn set_delay(&self, delay: std::time::Duration) -> &Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Number of exchanges performed.
    pub fn call_count(&self) -> usize {
        self.call_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenIssuer for MockTokenIssuer {
    async fn authenticate(&self) -> Result<TokenEntry, AuthError> {
        self.call_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(TokenEntry::new(
                    "mock-issued-token".to_string(),
                    Utc::now() + Duration::seconds(3600),
                ))
            })
    }
}
