//! Core Infrastructure
//!
//! HTTP transport abstraction shared by the token issuer and the
//! authenticated request executor.

pub mod transport;

pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, RequestBody,
    ReqwestHttpTransport,
};
