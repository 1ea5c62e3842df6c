//! Shared types for PlanLens crates.

pub mod config;
pub mod error;
pub mod row;

pub use config::ConnectionConfig;
pub use error::ExecutionError;
pub use row::Row;
