//! Token Lifecycle
//!
//! Single-slot token cache and the single-flight refresh controller.

pub mod cache;
pub mod controller;

pub use cache::TokenCache;
pub use controller::{MockTokenProvider, TokenController, TokenProvider};
