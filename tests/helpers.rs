// Shared test helpers for backend tests.
//
// This module provides sample records and a throwaway TCP sink used across
// multiple test files to reduce duplication.

use chrono::{DateTime, TimeZone, Utc};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use questdb_repository::{PgConnectionParams, Record, Value};

/// Fixed timestamp used by sample records: 2024-01-01T00:00:00Z.
pub fn sample_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// `sample_timestamp()` as epoch nanoseconds.
#[allow(dead_code)] // Used by other test files
pub const SAMPLE_TIMESTAMP_NS: i64 = 1_704_067_200_000_000_000;

/// Two device readings shaped like the demo table.
#[allow(dead_code)] // Used by other test files
pub fn sample_readings() -> Vec<Record> {
    vec![
        Record::new()
            .with("timestamp", sample_timestamp())
            .with("device_id", "device_A")
            .with("temperature", 25.5)
            .with("humidity", 60.1),
        Record::new()
            .with("timestamp", sample_timestamp())
            .with("device_id", "device_B")
            .with("temperature", 26.1)
            .with("humidity", 58.8),
    ]
}

/// A record mixing every value class the encoder distinguishes.
#[allow(dead_code)] // Used by other test files
pub fn mixed_record() -> Record {
    Record::new()
        .with("timestamp", sample_timestamp())
        .with("name", "x")
        .with("n", 3i64)
        .with("flag", true)
        .with("region", Value::Symbol("eu".into()))
}

/// Connection parameters pointing at a closed local port.
#[allow(dead_code)] // Used by other test files
pub fn unreachable_pg_params() -> PgConnectionParams {
    PgConnectionParams {
        host: "127.0.0.1".to_string(),
        port: 1,
        dbname: "qdb".to_string(),
        user: "admin".to_string(),
        password: "quest".to_string(),
    }
}

/// Binds a listener on an ephemeral port and collects everything each
/// accepted connection sends until it closes.
///
/// Returns the port and a handle resolving to the payload of every
/// connection accepted before the listener task was stopped.
#[allow(dead_code)] // Used by other test files
pub async fn spawn_tcp_sink(connections: usize) -> (u16, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let port = listener.local_addr().expect("local addr").port();

    let handle = tokio::spawn(async move {
        let mut payloads = Vec::with_capacity(connections);
        for _ in 0..connections {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.expect("read");
            payloads.push(buf);
        }
        payloads
    });

    (port, handle)
}
