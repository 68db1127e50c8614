//! Bearer Auth Integration Module
//!
//! Token lifecycle management and authenticated request execution for a
//! protected API: a credential (client-credentials or username/password)
//! is exchanged for a short-lived bearer token, cached in a single
//! process-wide slot, refreshed single-flight under concurrent callers,
//! and replaced exactly once when a downstream 401 proves it invalid.
//!
//! # Features
//!
//! - Client-credentials and username/password authentication exchanges
//! - Single-slot token cache with skewed, read-time expiry
//! - Single-flight refresh: concurrent callers share one exchange
//! - 401 contract: force-refresh and retry exactly once, then fail
//! - Startup warmup hook with non-fatal failure
//!
//! # Example
//!
//! ```rust,ignore
//! use bearer_auth_integration::{auth_config, BearerAuthClient, ProtectedRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = auth_config()
//!         .issuer_url("https://issuer.example.com/token")
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .scope("api:read")
//!         .expires_in_mins(5)
//!         .build()?;
//!
//!     let client = BearerAuthClient::new(config);
//!     client.warm_up().await;
//!
//!     let body = client
//!         .post_json(
//!             "https://api.example.com/users/add",
//!             serde_json::json!({"firstName": "Ada", "age": 36}),
//!         )
//!         .await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The module is organized into several sub-modules:
//!
//! - `types`: configuration and token data structures
//! - `error`: error hierarchy for the auth and request paths
//! - `core`: HTTP transport abstraction (reqwest-backed + mock)
//! - `issuer`: the authentication exchange client
//! - `token`: single-slot cache and single-flight refresh controller
//! - `executor`: bearer attachment and the 401 retry contract
//! - `builders`: fluent configuration builder
//! - `client`: high-level facade combining all of the above

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod executor;
pub mod issuer;
pub mod token;
pub mod types;

// Re-export main client
pub use client::BearerAuthClient;

// Re-export builders
pub use builders::{auth_config, AuthConfigBuilder};

// Re-export errors
pub use error::{AuthError, AuthResult, ConfigError, RequestError, RequestResult, TransportError};

// Re-export types
pub use types::{
    mask_token, AuthConfig, Credential, StandardTokenResponse, TokenEntry, TokenField,
    TokenPayload,
};

// Re-export core components
pub use core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, RequestBody,
    ReqwestHttpTransport,
};

// Re-export issuer
pub use issuer::{HttpTokenIssuer, MockTokenIssuer, TokenIssuer, FALLBACK_TTL_SECS};

// Re-export token lifecycle
pub use token::{MockTokenProvider, TokenCache, TokenController, TokenProvider};

// Re-export executor
pub use executor::{AuthenticatedExecutor, ProtectedRequest};
