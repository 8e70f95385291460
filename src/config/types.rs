//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration. Every connection option can also be supplied through the
//! environment (and therefore a `.env` file loaded by the binary).

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::backend::http::base_url_for;
use crate::backend::{HttpBackend, PgConnectionParams, PostgresBackend, SocketBackend};
use crate::config::constants::*;
use crate::error_handling::InitializationError;
use crate::repository::{Protocol, Repository};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Connection and runtime configuration.
///
/// Can be built programmatically (`..Default::default()`) or parsed from the
/// command line, where every connection option falls back to its
/// `QUESTDB_*` environment variable.
///
/// # Examples
///
/// ```no_run
/// use questdb_repository::{Config, Protocol, Repository};
///
/// let config = Config {
///     protocol: Protocol::Http,
///     host: "db.internal".to_string(),
///     ..Default::default()
/// };
/// let repo = config.build_repository().expect("valid configuration");
/// assert_eq!(repo.protocol(), Protocol::Http);
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "questdb_repository",
    about = "Write and read QuestDB time-series records over PostgreSQL wire, HTTP, or line protocol"
)]
pub struct Config {
    /// Wire protocol used for the demo run
    #[arg(long, value_enum, default_value = "pg")]
    pub protocol: Protocol,

    /// Store host name
    #[arg(long, env = "QUESTDB_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// PostgreSQL wire port
    #[arg(long, env = "QUESTDB_PG_PORT", default_value_t = DEFAULT_PG_PORT)]
    pub pg_port: u16,

    /// HTTP API port
    #[arg(long, env = "QUESTDB_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Line protocol TCP port
    #[arg(long, env = "QUESTDB_INFLUX_PORT", default_value_t = DEFAULT_ILP_PORT)]
    pub ilp_port: u16,

    /// Database name (PostgreSQL wire)
    #[arg(long, env = "QUESTDB_DB", default_value = DEFAULT_DBNAME)]
    pub dbname: String,

    /// User name (PostgreSQL wire)
    #[arg(long, env = "QUESTDB_USER", default_value = DEFAULT_USER)]
    pub user: String,

    /// Password (PostgreSQL wire)
    #[arg(long, env = "QUESTDB_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,

    /// HTTP query path (the store answers JSON on `/exec` in current releases)
    #[arg(long, default_value = DEFAULT_QUERY_PATH)]
    pub query_path: String,

    /// Table used by the demo run
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Per-operation timeout in seconds (0 disables it)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: Protocol::PostgresWire,
            host: DEFAULT_HOST.to_string(),
            pg_port: DEFAULT_PG_PORT,
            http_port: DEFAULT_HTTP_PORT,
            ilp_port: DEFAULT_ILP_PORT,
            dbname: DEFAULT_DBNAME.to_string(),
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            query_path: DEFAULT_QUERY_PATH.to_string(),
            table: DEFAULT_TABLE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// The configured timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn pg_params(&self) -> PgConnectionParams {
        PgConnectionParams {
            host: self.host.clone(),
            port: self.pg_port,
            dbname: self.dbname.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    /// Builds the backend for `protocol`.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if the HTTP client cannot be created.
    pub fn build_backend(
        &self,
        protocol: Protocol,
    ) -> Result<Box<dyn Repository>, InitializationError> {
        let timeout = self.timeout();
        let repo: Box<dyn Repository> = match protocol {
            Protocol::PostgresWire => {
                let backend = PostgresBackend::new(self.pg_params());
                Box::new(match timeout {
                    Some(t) => backend.with_timeout(t),
                    None => backend,
                })
            }
            Protocol::Http => {
                let base_url = base_url_for(&self.host, self.http_port);
                Box::new(
                    HttpBackend::from_base_url(&base_url, timeout)?
                        .with_query_path(self.query_path.clone()),
                )
            }
            Protocol::LineProtocol => {
                let backend = SocketBackend::new(self.host.clone(), self.ilp_port);
                Box::new(match timeout {
                    Some(t) => backend.with_timeout(t),
                    None => backend,
                })
            }
        };
        Ok(repo)
    }

    /// Builds the backend for the configured `protocol`.
    pub fn build_repository(&self) -> Result<Box<dyn Repository>, InitializationError> {
        self.build_backend(self.protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.protocol, Protocol::PostgresWire);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.pg_port, 8812);
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.ilp_port, 9009);
        assert_eq!(config.dbname, "qdb");
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = Config {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_parse_cli_flags() {
        let config = Config::try_parse_from([
            "questdb_repository",
            "--protocol",
            "ilp",
            "--host",
            "db.internal",
            "--ilp-port",
            "19009",
            "--table",
            "sensor_data",
            "--log-format",
            "json",
        ])
        .expect("flags should parse");
        assert_eq!(config.protocol, Protocol::LineProtocol);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.ilp_port, 19009);
        assert_eq!(config.table, "sensor_data");
        assert!(matches!(config.log_format, LogFormat::Json));
    }

    #[test]
    fn test_unknown_protocol_is_rejected() {
        let result = Config::try_parse_from(["questdb_repository", "--protocol", "grpc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_backends_for_ipv6_host() {
        let config = Config {
            host: "::1".to_string(),
            ..Default::default()
        };
        for protocol in [Protocol::PostgresWire, Protocol::Http, Protocol::LineProtocol] {
            let repo = config.build_backend(protocol).expect("IPv6 host should build");
            assert_eq!(repo.protocol(), protocol);
        }
    }

    #[test]
    fn test_build_repository_for_each_protocol() {
        let config = Config::default();
        for protocol in [Protocol::PostgresWire, Protocol::Http, Protocol::LineProtocol] {
            let repo = config.build_backend(protocol).expect("backend should build");
            assert_eq!(repo.protocol(), protocol);
        }
    }
}
