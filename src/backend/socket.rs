//! InfluxDB line protocol over raw TCP.
//!
//! Write only. Each `write` opens a fresh connection, streams the encoded
//! lines followed by one terminating newline, and closes. Nothing is read
//! back: success means the OS accepted the bytes, not that the rows are
//! visible. Rows the store cannot ingest are dropped on the server side.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::with_timeout;
use crate::error_handling::{RepositoryError, TransportError};
use crate::line_protocol;
use crate::record::Record;
use crate::repository::{Protocol, Repository};

/// Repository backend streaming line protocol to `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketBackend {
    host: String,
    port: u16,
    timeout: Option<Duration>,
}

impl SocketBackend {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Bounds connecting and sending the payload by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn send(&self, payload: &[u8]) -> Result<(), RepositoryError> {
        let addr = self.addr();
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| {
                debug!("Failed to connect to {addr}: {source}");
                TransportError::Connect {
                    addr: addr.clone(),
                    source,
                }
            })?;

        stream.write_all(payload).await.map_err(TransportError::Io)?;
        // The store only ingests a line once it sees its terminator.
        stream.write_all(b"\n").await.map_err(TransportError::Io)?;
        stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

#[async_trait]
impl Repository for SocketBackend {
    async fn write(&self, records: &[Record], table: &str) -> Result<(), RepositoryError> {
        if records.is_empty() {
            return Ok(());
        }

        let payload = line_protocol::encode_bytes(table, records);
        debug!(
            "Streaming {} lines ({} bytes) to {}",
            records.len(),
            payload.len() + 1,
            self.addr()
        );
        with_timeout(self.timeout, self.send(&payload)).await
    }

    async fn read(&self, _query: &str) -> Result<Vec<Record>, RepositoryError> {
        Err(RepositoryError::unsupported(self.protocol(), "read"))
    }

    fn protocol(&self) -> Protocol {
        Protocol::LineProtocol
    }
}
