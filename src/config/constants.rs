//! Configuration constants.
//!
//! This module defines the defaults and protocol limits used throughout the
//! library.

// Connection defaults (QuestDB out-of-the-box ports and credentials)
pub const DEFAULT_HOST: &str = "localhost";
/// PostgreSQL wire protocol port
pub const DEFAULT_PG_PORT: u16 = 8812;
/// HTTP REST API port
pub const DEFAULT_HTTP_PORT: u16 = 9000;
/// InfluxDB line protocol TCP port
pub const DEFAULT_ILP_PORT: u16 = 9009;
pub const DEFAULT_DBNAME: &str = "qdb";
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "quest";

/// Table written and read by the CLI demo
pub const DEFAULT_TABLE: &str = "my_metrics";

/// Default per-operation timeout in seconds (0 disables it)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// HTTP endpoints
/// Bulk-import endpoint receiving the line-protocol upload
pub const DEFAULT_IMPORT_PATH: &str = "/imp";
/// Query endpoint answering with a `columns` + `dataset` JSON document
pub const DEFAULT_QUERY_PATH: &str = "/exp";
/// Multipart form field carrying the upload
pub const IMPORT_PART_NAME: &str = "data";
/// File name announced for the upload
pub const IMPORT_FILE_NAME: &str = "influx_payload.txt";

pub const HTTP_USER_AGENT: &str = concat!("questdb_repository/", env!("CARGO_PKG_VERSION"));

/// Maximum bind parameters in one PostgreSQL wire statement.
/// Larger batches are split into several statements in the same transaction.
pub const MAX_BIND_PARAMS: usize = 65_535;
