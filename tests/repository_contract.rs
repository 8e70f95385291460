//! Contract tests run against every backend through `dyn Repository`.
//!
//! Callers only see the trait, so the guarantees that hold for all backends
//! are checked here once, without a running store.

mod helpers;

use helpers::unreachable_pg_params;
use questdb_repository::{
    Config, ErrorKind, HttpBackend, PostgresBackend, Protocol, Repository, SocketBackend,
};

fn unreachable_backends() -> Vec<Box<dyn Repository>> {
    vec![
        Box::new(PostgresBackend::new(unreachable_pg_params())),
        Box::new(HttpBackend::new("127.0.0.1", 1).expect("Failed to create backend")),
        Box::new(SocketBackend::new("127.0.0.1", 1)),
    ]
}

#[tokio::test]
async fn test_empty_write_is_a_no_op_for_every_backend() {
    // Every backend points at a closed port: any network attempt would fail.
    for repo in unreachable_backends() {
        repo.write(&[], "my_metrics")
            .await
            .unwrap_or_else(|e| panic!("{} empty write failed: {e}", repo.protocol()));
    }
}

#[tokio::test]
async fn test_non_empty_write_to_unreachable_store_is_transport_error() {
    let records = helpers::sample_readings();
    for repo in unreachable_backends() {
        let err = repo.write(&records, "my_metrics").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport, "{}", repo.protocol());
    }
}

#[tokio::test]
async fn test_read_failures_by_protocol() {
    for repo in unreachable_backends() {
        let err = repo.read("SELECT 1").await.unwrap_err();
        let expected = if repo.protocol().supports_read() {
            ErrorKind::Transport
        } else {
            ErrorKind::Unsupported
        };
        assert_eq!(err.kind(), expected, "{}", repo.protocol());
    }
}

#[test]
fn test_backends_are_shareable_between_tasks() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PostgresBackend>();
    assert_send_sync::<HttpBackend>();
    assert_send_sync::<SocketBackend>();
    assert_send_sync::<Box<dyn Repository>>();
}

#[test]
fn test_config_selects_backend() {
    let config = Config {
        protocol: Protocol::LineProtocol,
        ..Default::default()
    };
    let repo = config.build_repository().expect("backend should build");
    assert_eq!(repo.protocol(), Protocol::LineProtocol);
    assert!(!repo.protocol().supports_read());
}
