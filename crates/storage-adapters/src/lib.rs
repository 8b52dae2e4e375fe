//! Repository adapters: an in-memory store for tests and local runs, and
//! PostgreSQL behind the `db-postgres` feature.

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
