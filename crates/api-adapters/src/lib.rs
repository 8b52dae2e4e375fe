//! # api-adapters
//!
//! The HTTP surface of the blog (feature `web-axum`): routing, extractors,
//! the `{message, success, data, errors}` envelope and error mapping.

#[cfg(feature = "web-axum")]
pub mod envelope;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod metrics;
#[cfg(feature = "web-axum")]
pub mod resources;
#[cfg(feature = "web-axum")]
mod router;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use router::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
