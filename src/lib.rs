//! questdb_repository library: time-series records over three wire protocols
//!
//! This library writes and reads QuestDB records through one contract,
//! [`Repository`], implemented by three interchangeable backends:
//!
//! - [`PostgresBackend`]: parameterized SQL over the PostgreSQL wire protocol;
//!   writes are all-or-nothing and type errors are reported synchronously
//! - [`HttpBackend`]: line-protocol bulk import and JSON queries over HTTP
//! - [`SocketBackend`]: line protocol streamed over raw TCP; write only
//!
//! The line-protocol backends never report rows the store refuses to ingest;
//! the store drops them silently.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use questdb_repository::{PgConnectionParams, PostgresBackend, Record, Repository};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = PostgresBackend::new(PgConnectionParams {
//!     host: "localhost".to_string(),
//!     port: 8812,
//!     dbname: "qdb".to_string(),
//!     user: "admin".to_string(),
//!     password: "quest".to_string(),
//! });
//!
//! let reading = Record::new()
//!     .with("timestamp", Utc::now())
//!     .with("device_id", "device_A")
//!     .with("temperature", 25.5);
//! repo.write(&[reading], "my_metrics").await?;
//!
//! for row in repo.read("SELECT * FROM my_metrics ORDER BY timestamp DESC LIMIT 10").await? {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! All operations are `async` and require a Tokio runtime.

pub mod backend;
pub mod config;
mod error_handling;
pub mod initialization;
pub mod line_protocol;
mod record;
mod repository;

// Re-export public API
pub use backend::{HttpBackend, PgConnectionParams, PostgresBackend, SocketBackend};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{ErrorKind, InitializationError, QueryError, RepositoryError, TransportError};
pub use record::{format_timestamp, Record, Value, TIMESTAMP_FIELD};
pub use repository::{Protocol, Repository};
