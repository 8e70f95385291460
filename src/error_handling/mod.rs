//! Error handling for repository operations.
//!
//! This module provides:
//! - Error type definitions (`RepositoryError` and its transport/query parts)
//! - Categorization of driver errors (`sqlx`, `reqwest`) into that taxonomy
//!
//! Errors are categorized into:
//! - **Transport**: the store could not be reached or the exchange failed
//! - **Query**: the store rejected a query or returned nothing usable
//! - **RejectedWrite**: the store refused a write synchronously (PostgreSQL wire only)
//! - **Unsupported**: the protocol cannot perform the operation

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_sqlx_error, SqlPhase};
pub use types::{ErrorKind, InitializationError, QueryError, RepositoryError, TransportError};
