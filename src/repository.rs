//! The repository contract shared by every backend.

use async_trait::async_trait;
use clap::ValueEnum;
use strum_macros::EnumIter as EnumIterMacro;

use crate::error_handling::RepositoryError;
use crate::record::Record;

/// Wire protocol a backend speaks to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, ValueEnum)]
pub enum Protocol {
    /// PostgreSQL wire protocol (parameterized SQL)
    #[value(name = "pg")]
    PostgresWire,
    /// HTTP bulk import and query endpoints
    #[value(name = "http")]
    Http,
    /// InfluxDB line protocol over a raw TCP socket (write only)
    #[value(name = "ilp")]
    LineProtocol,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::PostgresWire => "PostgreSQL wire protocol",
            Protocol::Http => "HTTP",
            Protocol::LineProtocol => "InfluxDB line protocol",
        }
    }

    /// Whether backends speaking this protocol can serve `read`.
    pub fn supports_read(&self) -> bool {
        !matches!(self, Protocol::LineProtocol)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes and reads time-series records through one wire protocol.
///
/// Every call opens its own connection and releases it before returning,
/// on success and on every error path. Implementations hold nothing but
/// their immutable connection parameters, so a single instance can be
/// shared between tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Writes `records` into `table`.
    ///
    /// An empty slice returns `Ok(())` without touching the network.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Transport`] if the store cannot be reached or the
    ///   exchange fails
    /// - [`RepositoryError::RejectedWrite`] if the store refuses the batch
    ///   (PostgreSQL wire only; line-protocol ingestion drops bad rows
    ///   silently on the server)
    async fn write(&self, records: &[Record], table: &str) -> Result<(), RepositoryError>;

    /// Runs `query` and returns every result row, keyed by result column name
    /// in result column order.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Query`] if the store rejects the query, or the
    ///   statement produced no result set (DDL)
    /// - [`RepositoryError::Transport`] on connection or protocol failures
    /// - [`RepositoryError::Unsupported`] for write-only protocols
    async fn read(&self, query: &str) -> Result<Vec<Record>, RepositoryError>;

    /// The wire protocol this backend speaks.
    fn protocol(&self) -> Protocol;
}
