//! Authenticated Request Executor
//!
//! Wraps arbitrary outbound calls with bearer attachment and the 401
//! contract: on the first 401 force-refresh and retry exactly once; a
//! second 401 is terminal.

use std::sync::Arc;
use tracing::debug;

use crate::core::{HttpMethod, HttpRequest, HttpTransport, RequestBody};
use crate::error::RequestError;
use crate::token::TokenProvider;
use crate::types::token::mask_token;

/// A downstream request template. The executor adds the `Authorization`
/// header; everything else is supplied by the caller.
#[derive(Clone, Debug)]
pub struct ProtectedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// JSON body, when the call sends one.
    pub body: Option<serde_json::Value>,
}

impl ProtectedRequest {
    /// GET request template.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// POST request template with a JSON body.
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Executor for authenticated downstream calls.
pub struct AuthenticatedExecutor<P: TokenProvider, T: HttpTransport> {
    provider: Arc<P>,
    transport: Arc<T>,
}

impl<P: TokenProvider, T: HttpTransport> AuthenticatedExecutor<P, T> {
    /// Create new executor.
    pub fn new(provider: Arc<P>, transport: Arc<T>) -> Self {
        Self {
            provider,
            transport,
        }
    }

    /// Execute the request with a valid token, retrying once on 401.
    pub async fn execute(&self, request: ProtectedRequest) -> Result<String, RequestError> {
        let mut token = self.provider.get_valid_token().await?.token;
        let mut allow_retry_on_401 = true;

        loop {
            let response = self
                .transport
                .send(build_http_request(&request, &token))
                .await?;

            if response.status == 401 && allow_retry_on_401 {
                debug!(
                    url = %request.url,
                    token = %mask_token(&token),
                    "downstream rejected token, forcing refresh"
                );
                token = self.provider.invalidate_and_refresh(&token).await?.token;
                allow_retry_on_401 = false;
                continue;
            }

            if !response.is_success() {
                return Err(RequestError::DownstreamRejected {
                    status: response.status,
                    body: response.body,
                });
            }

            return Ok(response.body);
        }
    }
}

fn build_http_request(request: &ProtectedRequest, token: &str) -> HttpRequest {
    let mut http_request = HttpRequest::new(request.method, request.url.clone())
        .header("accept", "application/json")
        .header("authorization", format!("Bearer {}", token));
    for (name, value) in &request.headers {
        http_request = http_request.header(name.clone(), value.clone());
    }
    if let Some(body) = &request.body {
        http_request = http_request.body(RequestBody::Json(body.clone()));
    }
    http_request
}
