//! Bearer Auth Client
//!
//! High-level facade wiring transport, issuer, controller and executor.
//! This is the composition root: it owns the controller state explicitly,
//! so multiple independent clients (one per credential) can coexist
//! without global mutable state.

use std::sync::Arc;
use tracing::{info, warn};

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::{AuthError, RequestError};
use crate::executor::{AuthenticatedExecutor, ProtectedRequest};
use crate::issuer::HttpTokenIssuer;
use crate::token::{TokenController, TokenProvider};
use crate::types::config::AuthConfig;
use crate::types::token::TokenEntry;

/// Client combining the token lifecycle with authenticated request
/// execution against a protected API.
pub struct BearerAuthClient<T: HttpTransport + 'static = ReqwestHttpTransport> {
    controller: Arc<TokenController<HttpTokenIssuer<T>>>,
    executor: AuthenticatedExecutor<TokenController<HttpTokenIssuer<T>>, T>,
}

impl BearerAuthClient<ReqwestHttpTransport> {
    /// Create a client with the default reqwest transport.
    pub fn new(config: AuthConfig) -> Self {
        let timeout = config.timeout;
        Self::with_transport(config, ReqwestHttpTransport::with_timeout(timeout))
    }
}

impl<T: HttpTransport + 'static> BearerAuthClient<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: AuthConfig, transport: T) -> Self {
        let transport = Arc::new(transport);
        let issuer = Arc::new(HttpTokenIssuer::new(Arc::new(config), transport.clone()));
        let controller = Arc::new(TokenController::new(issuer));
        let executor = AuthenticatedExecutor::new(controller.clone(), transport);
        Self {
            controller,
            executor,
        }
    }

    /// The token controller, for callers that only need tokens.
    pub fn controller(&self) -> &Arc<TokenController<HttpTokenIssuer<T>>> {
        &self.controller
    }

    /// Get a currently valid token.
    pub async fn token(&self) -> Result<TokenEntry, AuthError> {
        self.controller.get_valid_token().await
    }

    /// Preload the token once at startup. Failure is non-fatal: the next
    /// caller will trigger a refresh on demand.
    pub async fn warm_up(&self) {
        match self.controller.refresh_token().await {
            Ok(_) => info!("token preloaded"),
            Err(err) => warn!(
                error = %err,
                "could not preload token, will refresh on demand"
            ),
        }
    }

    /// Execute an authenticated request.
    pub async fn execute(&self, request: ProtectedRequest) -> Result<String, RequestError> {
        self.executor.execute(request).await
    }

    /// Authenticated GET.
    pub async fn get(&self, url: impl Into<String>) -> Result<String, RequestError> {
        self.execute(ProtectedRequest::get(url)).await
    }

    /// Authenticated POST with a JSON body.
    pub async fn post_json(
        &self,
        url: impl Into<String>,
        body: serde_json::Value,
    ) -> Result<String, RequestError> {
        self.execute(ProtectedRequest::post_json(url, body)).await
    }
}
