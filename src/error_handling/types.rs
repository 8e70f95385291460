//! Error type definitions.
//!
//! This module defines the error taxonomy shared by all repository backends.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::repository::Protocol;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The configured HTTP base URL could not be used.
    #[error("Invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// Errors returned by every [`Repository`](crate::Repository) operation.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store could not be reached or the exchange failed on the wire.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The store rejected a query, or a query produced no usable result set.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// The store rejected a write (type or constraint violation).
    ///
    /// Only the PostgreSQL wire backend can report this; line-protocol ingestion
    /// drops offending rows on the server without telling the client.
    #[error("Write rejected by the store: {0}")]
    RejectedWrite(#[source] sqlx::Error),

    /// The backend's protocol cannot perform the requested operation.
    #[error("{operation} is not supported over {protocol}")]
    Unsupported {
        protocol: Protocol,
        operation: &'static str,
    },
}

/// Failures reaching the store or exchanging bytes with it.
#[derive(Error, Debug)]
pub enum TransportError {
    /// TCP connect failed (refused, unreachable, DNS failure).
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket read/write failed after the connection was established.
    #[error("Socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured transport timeout elapsed.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The HTTP endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    /// The HTTP request itself failed.
    #[error("HTTP request error: {0}")]
    Http(#[source] ReqwestError),

    /// The PostgreSQL wire driver failed outside of statement execution.
    #[error("Database connection error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Failures of the read path.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The store refused the statement.
    #[error("Query rejected by the store: {0}")]
    Rejected(#[source] sqlx::Error),

    /// The statement ran but produced no result set (e.g. DDL).
    ///
    /// Callers executing DDL through `read` should treat this as expected.
    #[error("Statement returned no result set")]
    NoResultSet,

    /// The store's response could not be decoded into rows.
    #[error("Malformed query response: {0}")]
    MalformedResponse(String),
}

/// Coarse error category, mirroring the variants of [`RepositoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorKind {
    Transport,
    Query,
    RejectedWrite,
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport error",
            ErrorKind::Query => "query error",
            ErrorKind::RejectedWrite => "rejected write",
            ErrorKind::Unsupported => "unsupported operation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RepositoryError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::Transport(_) => ErrorKind::Transport,
            RepositoryError::Query(_) => ErrorKind::Query,
            RepositoryError::RejectedWrite(_) => ErrorKind::RejectedWrite,
            RepositoryError::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// True when a statement ran through `read` but had nothing to return.
    pub fn is_no_result_set(&self) -> bool {
        matches!(self, RepositoryError::Query(QueryError::NoResultSet))
    }

    pub(crate) fn unsupported(protocol: Protocol, operation: &'static str) -> Self {
        RepositoryError::Unsupported {
            protocol,
            operation,
        }
    }
}
