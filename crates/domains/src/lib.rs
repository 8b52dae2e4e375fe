//! blog-api/crates/domains/src/lib.rs
//!
//! Entities, lifecycle rules, ownership policy, threading gates and the
//! visibility filter specs of the blog core, plus the ports adapters implement.

pub mod error;
pub mod models;
pub mod policy;
pub mod ports;
pub mod query;
pub mod threading;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use policy::{Action, Actor, Owned};
pub use ports::*;
pub use query::*;
