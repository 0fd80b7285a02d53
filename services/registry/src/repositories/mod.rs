//! Storage interface and backends for person records

pub mod person;

// Re-export for convenience
pub use person::{PersonStore, PgPersonStore, StoreError};
