//! Token Controller
//!
//! Refresh coordinator over the token cache. Guarantees single-flight: at
//! most one authentication exchange is in flight per controller, and every
//! concurrent caller joins its result instead of issuing its own exchange.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::issuer::TokenIssuer;
use crate::token::cache::TokenCache;
use crate::types::token::TokenEntry;

type SharedRefresh = Shared<BoxFuture<'static, Result<TokenEntry, AuthError>>>;

/// Token provider interface for callers that need a currently valid token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a currently valid token, refreshing on miss or expiry.
    async fn get_valid_token(&self) -> Result<TokenEntry, AuthError>;

    /// Refresh and return a token. Idempotent while a live token is
    /// cached: redundant calls return the cached entry without a new
    /// exchange.
    async fn refresh_token(&self) -> Result<TokenEntry, AuthError>;

    /// Forced refresh after a downstream 401 proved `rejected_token`
    /// invalid. Bypasses the valid-token shortcut for that token, but
    /// reuses any cached token that already replaced it and joins any
    /// refresh already in flight.
    async fn invalidate_and_refresh(&self, rejected_token: &str) -> Result<TokenEntry, AuthError>;
}

/// Refresh coordinator owning the cache and the single-flight state.
///
/// Clones share the same cache and in-flight slot. The internal lock is
/// held only around decision-and-dispatch, never across the network call:
/// waiters join the in-flight exchange's shared future. The controller
/// itself retains a clone of that future, so one waiter's cancellation
/// never cancels the exchange for the others.
pub struct TokenController<I: TokenIssuer + 'static> {
    issuer: Arc<I>,
    cache: TokenCache,
    in_flight: Arc<Mutex<Option<SharedRefresh>>>,
}

impl<I: TokenIssuer + 'static> Clone for TokenController<I> {
    fn clone(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
            cache: self.cache.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<I: TokenIssuer + 'static> TokenController<I> {
    /// Create a controller with an empty cache.
    pub fn new(issuer: Arc<I>) -> Self {
        Self::with_cache(issuer, TokenCache::new())
    }

    /// Create a controller over an existing cache.
    pub fn with_cache(issuer: Arc<I>, cache: TokenCache) -> Self {
        Self {
            issuer,
            cache,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// The cache this controller coordinates.
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Start an exchange and register it as the in-flight refresh. The
    /// caller must hold the `in_flight` lock.
    fn begin_refresh(&self) -> SharedRefresh {
        let issuer = self.issuer.clone();
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();

        async move {
            let result = issuer.authenticate().await;
            match &result {
                Ok(entry) => {
                    cache.store(entry.clone());
                    info!(
                        token = %entry.masked(),
                        expires_at = %entry.expires_at,
                        "stored refreshed token"
                    );
                }
                Err(err) => {
                    warn!(error = %err, code = err.error_code(), "token refresh failed");
                }
            }
            // open the single-flight slot for the next refresh; the cache
            // was updated first, so late arrivals hit the fast path
            in_flight.lock().unwrap().take();
            result
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl<I: TokenIssuer + 'static> TokenProvider for TokenController<I> {
    async fn get_valid_token(&self) -> Result<TokenEntry, AuthError> {
        if let Some(entry) = self.cache.peek() {
            return Ok(entry);
        }
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<TokenEntry, AuthError> {
        let shared = {
            let mut guard = self.in_flight.lock().unwrap();
            if let Some(existing) = guard.as_ref() {
                debug!("joining in-flight token refresh");
                existing.clone()
            } else {
                // double-check: another caller may have refreshed while we
                // were contending for the lock
                if let Some(entry) = self.cache.peek() {
                    return Ok(entry);
                }
                let shared = self.begin_refresh();
                *guard = Some(shared.clone());
                shared
            }
        };
        shared.await
    }

    async fn invalidate_and_refresh(&self, rejected_token: &str) -> Result<TokenEntry, AuthError> {
        let shared = {
            let mut guard = self.in_flight.lock().unwrap();
            if let Some(existing) = guard.as_ref() {
                // an exchange is already underway; its result is newer than
                // the rejected token
                debug!("joining in-flight refresh after downstream rejection");
                existing.clone()
            } else {
                // reuse a token another caller already swapped in, but a
                // cached copy of the rejected token is known-bad even
                // though unexpired
                if let Some(entry) = self.cache.peek() {
                    if entry.token != rejected_token {
                        return Ok(entry);
                    }
                }
                let shared = self.begin_refresh();
                *guard = Some(shared.clone());
                shared
            }
        };
        shared.await
    }
}

/// Mock token provider for testing the request executor.
#[derive(Default)]
pub struct MockTokenProvider {
    tokens: Mutex<VecDeque<Result<TokenEntry, AuthError>>>,
    get_history: Mutex<Vec<()>>,
    refresh_history: Mutex<Vec<()>>,
    invalidate_history: Mutex<Vec<String>>,
}

impl MockTokenProvider {
    /// Create new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a token to hand out, valid for one hour.
    pub fn queue_token(&self, token: &str) -> &Self {
        self.tokens.lock().unwrap().push_back(Ok(TokenEntry::new(
            token.to_string(),
            chrono::Utc::now() + chrono::Duration::seconds(3600),
        )));
        self
    }

    /// Queue an error to hand out.
    pub fn queue_error(&self, error: AuthError) -> &Self {
        self.tokens.lock().unwrap().push_back(Err(error));
        self
    }

    /// Tokens handed out via `get_valid_token`.
    pub fn get_count(&self) -> usize {
        self.get_history.lock().unwrap().len()
    }

    /// Explicit refreshes requested via `refresh_token`.
    pub fn refresh_count(&self) -> usize {
        self.refresh_history.lock().unwrap().len()
    }

    /// Rejected tokens passed to `invalidate_and_refresh`.
    pub fn invalidated_tokens(&self) -> Vec<String> {
        self.invalidate_history.lock().unwrap().clone()
    }

    fn next(&self) -> Result<TokenEntry, AuthError> {
        self.tokens.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(TokenEntry::new(
                "mock-provider-token".to_string(),
                chrono::Utc::now() + chrono::Duration::seconds(3600),
            ))
        })
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn get_valid_token(&self) -> Result<TokenEntry, AuthError> {
        self.get_history.lock().unwrap().push(());
        self.next()
    }

    async fn refresh_token(&self) -> Result<TokenEntry, AuthError> {
        self.refresh_history.lock().unwrap().push(());
        self.next()
    }

    async fn invalidate_and_refresh(&self, rejected_token: &str) -> Result<TokenEntry, AuthError> {
        self.invalidate_history
            .lock()
            .unwrap()
            .push(rejected_token.to_string());
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::MockTokenIssuer;
    use std::time::Duration;

    fn controller_with(issuer: MockTokenIssuer) -> TokenController<MockTokenIssuer> {
        TokenController::new(Arc::new(issuer))
    }

    #[tokio::test]
    async fn test_single_load_repeated_reads() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("AAA", 3600);
        let controller = controller_with(issuer);

        for _ in 0..5 {
            let entry = controller.get_valid_token().await.unwrap();
            assert_eq!(entry.token, "AAA");
        }
        assert_eq!(controller.issuer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_idempotent_while_valid() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("AAA", 3600);
        let controller = controller_with(issuer);

        let first = controller.refresh_token().await.unwrap();
        let second = controller.refresh_token().await.unwrap();
        assert_eq!(first.token, second.token);
        assert_eq!(controller.issuer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_flight_under_concurrency() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("AAA", 3600);
        issuer.set_delay(Duration::from_millis(100));
        let controller = controller_with(issuer);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let controller = controller.clone();
            handles.push(tokio::spawn(
                async move { controller.get_valid_token().await },
            ));
        }

        for handle in handles {
            let entry = handle.await.unwrap().unwrap();
            assert_eq!(entry.token, "AAA");
        }
        assert_eq!(controller.issuer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_shared_by_all_waiters() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_error(AuthError::IssuerRejected {
            status: 401,
            body: "bad creds".to_string(),
        });
        issuer.set_delay(Duration::from_millis(100));
        let controller = controller_with(issuer);

        let mut handles = Vec::new();
        for _ in 0..3 {
            let controller = controller.clone();
            handles.push(tokio::spawn(
                async move { controller.get_valid_token().await },
            ));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(
                err,
                AuthError::IssuerRejected { status: 401, body } if body == "bad creds"
            ));
        }
        assert_eq!(controller.issuer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_stores_nothing_and_allows_retry() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_error(AuthError::Network {
            message: "connection reset".to_string(),
        });
        issuer.queue_token("BBB", 3600);
        let controller = controller_with(issuer);

        assert!(controller.get_valid_token().await.is_err());
        assert!(controller.cache().peek().is_none());

        let entry = controller.get_valid_token().await.unwrap();
        assert_eq!(entry.token, "BBB");
        assert_eq!(controller.issuer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_bypasses_valid_shortcut() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("AAA", 3600);
        issuer.queue_token("BBB", 3600);
        let controller = controller_with(issuer);

        let first = controller.get_valid_token().await.unwrap();
        assert_eq!(first.token, "AAA");

        // AAA is unexpired but known-bad: a forced refresh must exchange
        let fresh = controller.invalidate_and_refresh("AAA").await.unwrap();
        assert_eq!(fresh.token, "BBB");
        assert_eq!(controller.issuer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_reuses_newer_token() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("BBB", 3600);
        let controller = controller_with(issuer);

        // another caller already replaced the rejected token
        controller.refresh_token().await.unwrap();

        let fresh = controller.invalidate_and_refresh("AAA").await.unwrap();
        assert_eq!(fresh.token, "BBB");
        assert_eq!(controller.issuer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_new_exchange() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("AAA", 3600);
        issuer.queue_token("BBB", 3600);
        let controller = controller_with(issuer);

        controller.get_valid_token().await.unwrap();
        controller.cache().clear();

        let entry = controller.get_valid_token().await.unwrap();
        assert_eq!(entry.token, "BBB");
        assert_eq!(controller.issuer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_waiter_cancellation_leaves_exchange_running() {
        let issuer = MockTokenIssuer::new();
        issuer.queue_token("AAA", 3600);
        issuer.set_delay(Duration::from_millis(100));
        let controller = controller_with(issuer);

        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.get_valid_token().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter.abort();

        // the exchange survives the aborted waiter; a later caller joins
        // it and no second exchange starts
        let entry = controller.get_valid_token().await.unwrap();
        assert_eq!(entry.token, "AAA");
        assert_eq!(controller.issuer.call_count(), 1);
    }
}
