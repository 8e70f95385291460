//! Error categorization.
//!
//! Driver errors from `sqlx` and `reqwest` are mapped onto the repository
//! taxonomy here, so every backend reports the same kind of failure the same
//! way.

use log::debug;

use super::types::{QueryError, RepositoryError, TransportError};

/// Which part of a PostgreSQL wire call produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlPhase {
    /// Opening the connection or starting a transaction.
    Connect,
    /// Executing the insert or committing it.
    Write,
    /// Preparing or executing a query.
    Read,
}

/// Categorizes a `sqlx::Error` into a `RepositoryError`.
///
/// A `sqlx::Error::Database` is the server answering "no": a rejected write
/// on the write path, a rejected query on the read path. Everything else
/// (I/O, TLS, protocol, pool, decoding) is a transport failure, except that
/// row-decoding errors on the read path are reported as malformed responses.
///
/// # Arguments
///
/// * `err` - The driver error
/// * `phase` - Where in the call the error occurred
pub fn categorize_sqlx_error(err: sqlx::Error, phase: SqlPhase) -> RepositoryError {
    let categorized = match (phase, err) {
        (SqlPhase::Write, err @ sqlx::Error::Database(_)) => RepositoryError::RejectedWrite(err),
        (SqlPhase::Read, err @ sqlx::Error::Database(_)) => QueryError::Rejected(err).into(),
        (
            SqlPhase::Read,
            err @ (sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }),
        ) => QueryError::MalformedResponse(err.to_string()).into(),
        (_, err) => TransportError::Database(err).into(),
    };
    debug!("PostgreSQL wire {phase:?} failed: {categorized}");
    categorized
}

/// Categorizes a `reqwest::Error` into a `RepositoryError`.
///
/// Body decoding failures mean the store answered with something that is not
/// a query result document; every other request failure is a transport error.
pub fn categorize_reqwest_error(err: reqwest::Error) -> RepositoryError {
    let categorized = if err.is_decode() {
        QueryError::MalformedResponse(err.to_string()).into()
    } else {
        TransportError::Http(err).into()
    };
    debug!("HTTP request failed: {categorized}");
    categorized
}
