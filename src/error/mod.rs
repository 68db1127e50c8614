//! Error Types
//!
//! Error hierarchy for the token lifecycle and the authenticated request path.

use thiserror::Error;

/// Error produced by the authentication exchange or the token lifecycle.
///
/// `Clone` is required by the single-flight refresh: every waiter joined on
/// an in-flight exchange receives the same error the refresher observed.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Issuer rejected the authentication exchange ({status}): {body}")]
    IssuerRejected { status: u16, body: String },

    #[error("Token field '{field}' absent or empty in issuer response")]
    TokenFieldMissing { field: String },

    #[error("Malformed issuer response: {message}")]
    InvalidResponse { message: String },

    #[error("Network error during authentication exchange: {message}")]
    Network { message: String },

    #[error("Authentication exchange timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl AuthError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IssuerRejected { .. } => "AUTH_ISSUER_REJECTED",
            Self::TokenFieldMissing { .. } => "AUTH_TOKEN_FIELD_MISSING",
            Self::InvalidResponse { .. } => "AUTH_INVALID_RESPONSE",
            Self::Network { .. } => "AUTH_NETWORK",
            Self::Timeout { .. } => "AUTH_TIMEOUT",
        }
    }
}

/// Error produced by an authenticated downstream request.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Token acquisition failed before or during the request. A caller that
    /// joined an in-flight refresh receives the refresher's error.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Downstream call rejected ({status}): {body}")]
    DownstreamRejected { status: u16, body: String },

    #[error("Network error during downstream call: {message}")]
    Network { message: String },
}

impl RequestError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::DownstreamRejected { .. } => "REQUEST_DOWNSTREAM_REJECTED",
            Self::Network { .. } => "REQUEST_NETWORK",
        }
    }
}

/// Transport-level failure, mapped into `AuthError` or `RequestError`
/// depending on which call path issued the request.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionFailed { message } => AuthError::Network { message },
            TransportError::Timeout { seconds } => AuthError::Timeout { seconds },
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionFailed { message } => RequestError::Network { message },
            TransportError::Timeout { seconds } => RequestError::Network {
                message: format!("request timed out after {}s", seconds),
            },
        }
    }
}

/// Configuration validation error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid issuer URL: {url}")]
    InvalidIssuerUrl { url: String },

    #[error("Expiry skew must be at least 1 minute, got {minutes}")]
    InvalidSkew { minutes: u64 },

    #[error("Both client-credentials and password credentials were configured")]
    ConflictingCredentials,
}

/// Result type for token lifecycle operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type for authenticated request operations.
pub type RequestResult<T> = Result<T, RequestError>;
