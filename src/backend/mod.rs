//! Concrete repository backends, one per wire protocol.
//!
//! - [`PostgresBackend`]: parameterized SQL over the PostgreSQL wire protocol
//! - [`HttpBackend`]: line-protocol bulk import and JSON queries over HTTP
//! - [`SocketBackend`]: line protocol streamed over raw TCP (write only)

pub mod http;
pub mod postgres;
pub mod socket;

use std::future::Future;
use std::time::Duration;

pub use http::HttpBackend;
pub use postgres::{PgConnectionParams, PostgresBackend};
pub use socket::SocketBackend;

use crate::error_handling::{RepositoryError, TransportError};

/// Runs `fut`, failing with [`TransportError::Timeout`] once `limit` elapses.
///
/// `None` waits for as long as the transport itself does.
pub(crate) async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                log::debug!("Operation timed out after {limit:?}");
                Err(TransportError::Timeout(limit).into())
            }
        },
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let result: Result<(), RepositoryError> = with_timeout(Some(Duration::from_secs(1)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(matches!(
            err,
            RepositoryError::Transport(TransportError::Timeout(d)) if d == Duration::from_secs(1)
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_none_passes_result_through() {
        let result = with_timeout(None, async { Ok::<_, RepositoryError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
