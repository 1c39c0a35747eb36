//! HTTP API.
//!
//! `api_router()` returns a composable `Router` serving the JSON endpoints
//! and the uploaded files under `/uploads`.

pub mod endpoints;
pub mod error;
pub mod form;
pub mod router;
pub mod types;

pub use router::api_router;
pub use types::ApiContext;
