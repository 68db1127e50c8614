//! Data Types
//!
//! Configuration and token data structures.

pub mod config;
pub mod token;

pub use config::{AuthConfig, Credential, TokenField, DEFAULT_EXPIRES_IN_MINS, DEFAULT_TOKEN_JSON_KEY};
pub use token::{mask_token, parse_token_payload, StandardTokenResponse, TokenEntry, TokenPayload};
