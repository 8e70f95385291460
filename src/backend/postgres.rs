//! PostgreSQL wire protocol backend.
//!
//! Writes go through one parameterized multi-row `INSERT` inside a single
//! transaction, so a batch is applied completely or not at all. Reads run the
//! caller's SQL verbatim and materialize every row in memory.
//!
//! Each call opens its own connection with `PgConnection::connect_with` and
//! drops it before returning; an uncommitted transaction rolls back when it
//! is dropped on an error path.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgValueFormat};
use sqlx::query_builder::Separated;
use sqlx::{
    Column, Connection, Executor, Postgres, QueryBuilder, Row, Statement, TypeInfo, ValueRef,
};
use uuid::Uuid;

use super::with_timeout;
use crate::config::MAX_BIND_PARAMS;
use crate::error_handling::{categorize_sqlx_error, QueryError, RepositoryError, SqlPhase};
use crate::record::{Record, Value};
use crate::repository::{Protocol, Repository};

/// Connection parameters for the PostgreSQL wire endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct PgConnectionParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl PgConnectionParams {
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .password(&self.password)
    }
}

// Keeps the password out of logs.
impl fmt::Debug for PgConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Repository backend speaking the PostgreSQL wire protocol.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    params: PgConnectionParams,
    timeout: Option<Duration>,
}

impl PostgresBackend {
    pub fn new(params: PgConnectionParams) -> Self {
        Self {
            params,
            timeout: None,
        }
    }

    /// Bounds connecting and each statement exchange by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn params(&self) -> &PgConnectionParams {
        &self.params
    }

    async fn connect(&self) -> Result<PgConnection, RepositoryError> {
        let options = self.params.connect_options();
        debug!(
            "Connecting to {}:{}/{}",
            self.params.host, self.params.port, self.params.dbname
        );
        with_timeout(self.timeout, async {
            PgConnection::connect_with(&options)
                .await
                .map_err(|e| categorize_sqlx_error(e, SqlPhase::Connect))
        })
        .await
    }
}

#[async_trait]
impl Repository for PostgresBackend {
    async fn write(&self, records: &[Record], table: &str) -> Result<(), RepositoryError> {
        if records.is_empty() {
            return Ok(());
        }

        // The first record decides the column list for the whole batch.
        let columns: Vec<&str> = records[0].keys().collect();

        let mut conn = self.connect().await?;
        let inserted = with_timeout(
            self.timeout,
            insert_batch(&mut conn, table, &columns, records),
        )
        .await?;
        close(conn).await;

        debug!("Inserted {inserted} rows into {table}");
        Ok(())
    }

    async fn read(&self, query: &str) -> Result<Vec<Record>, RepositoryError> {
        let mut conn = self.connect().await?;
        let records = with_timeout(self.timeout, fetch_records(&mut conn, query)).await?;
        close(conn).await;

        debug!("Query returned {} rows", records.len());
        Ok(records)
    }

    fn protocol(&self) -> Protocol {
        Protocol::PostgresWire
    }
}

/// Graceful close on the success path; a failed close has nothing left to
/// undo, since the work is already committed or fetched.
async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("Ignoring error while closing connection: {e}");
    }
}

/// Inserts `records` in one transaction, splitting into several statements
/// only when the bind-parameter limit requires it.
async fn insert_batch(
    conn: &mut PgConnection,
    table: &str,
    columns: &[&str],
    records: &[Record],
) -> Result<u64, RepositoryError> {
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| categorize_sqlx_error(e, SqlPhase::Connect))?;

    let rows_per_statement = (MAX_BIND_PARAMS / columns.len().max(1)).max(1);
    let mut inserted = 0;
    for chunk in records.chunks(rows_per_statement) {
        let mut builder = build_insert(table, columns, chunk);
        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| categorize_sqlx_error(e, SqlPhase::Write))?;
        inserted += result.rows_affected();
    }

    tx.commit()
        .await
        .map_err(|e| categorize_sqlx_error(e, SqlPhase::Write))?;
    Ok(inserted)
}

/// Builds `INSERT INTO table (c1, c2) VALUES ($1, $2), ($3, $4), ...`.
///
/// A record missing one of the columns binds `NULL` for it; keys not in
/// `columns` are ignored.
fn build_insert<'args>(
    table: &str,
    columns: &[&str],
    records: &[Record],
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO {table} ({}) ", columns.join(", ")));
    builder.push_values(records, |mut row, record| {
        for column in columns {
            bind_value(&mut row, record.get(column).unwrap_or(&Value::Null));
        }
    });
    builder
}

fn bind_value(row: &mut Separated<'_, '_, Postgres, &'static str>, value: &Value) {
    match value {
        // TIMESTAMP in UTC; the connection's session time zone is UTC.
        Value::Timestamp(ts) => row.push_bind(ts.naive_utc()),
        Value::Text(s) | Value::Symbol(s) => row.push_bind(s.clone()),
        Value::Integer(i) => row.push_bind(*i),
        Value::Float(f) => row.push_bind(*f),
        Value::Boolean(b) => row.push_bind(*b),
        Value::Null => row.push_bind(None::<String>),
    };
}

async fn fetch_records(conn: &mut PgConnection, query: &str) -> Result<Vec<Record>, RepositoryError> {
    let statement = (&mut *conn)
        .prepare(query)
        .await
        .map_err(|e| categorize_sqlx_error(e, SqlPhase::Read))?;

    if statement.columns().is_empty() {
        // Run it anyway so DDL takes effect, then report that there is
        // nothing to return.
        statement
            .query()
            .execute(&mut *conn)
            .await
            .map_err(|e| categorize_sqlx_error(e, SqlPhase::Read))?;
        debug!("Statement produced no result set");
        return Err(QueryError::NoResultSet.into());
    }

    let rows = statement
        .query()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| categorize_sqlx_error(e, SqlPhase::Read))?;

    rows.iter()
        .map(|row| row_to_record(row).map_err(|e| categorize_sqlx_error(e, SqlPhase::Read)))
        .collect()
}

/// Converts a result row into a record keyed by result column name.
fn row_to_record(row: &PgRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        record.insert(column.name(), value);
    }
    Ok(record)
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Boolean),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| Value::Integer(i64::from(v))),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| Value::Integer(i64::from(v))),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::Integer),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| Value::Float(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::Float),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(Value::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| Value::Timestamp(v.and_utc())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|v| Value::Timestamp(v.and_time(NaiveTime::MIN).and_utc())),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(idx)?
            .map(decimal_to_value),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(idx)?
            .map(|v| Value::Text(v.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(idx)?
            .map(|v| Value::Text(bytea_to_text(&v))),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::Text)
        }
        _ => raw_text(row, idx, type_name)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Reads a column of a type without a dedicated decoder.
///
/// Only text-format values can be surfaced as-is; binary values of an
/// unknown type have no portable text rendering and fail the read.
fn raw_text(row: &PgRow, idx: usize, type_name: &str) -> Result<Option<String>, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(None);
    }
    match raw.format() {
        PgValueFormat::Text => raw
            .as_str()
            .map(|s| Some(s.to_string()))
            .map_err(|source| sqlx::Error::ColumnDecode {
                index: idx.to_string(),
                source,
            }),
        PgValueFormat::Binary => Err(unsupported_column_type(idx, type_name)),
    }
}

fn unsupported_column_type(idx: usize, type_name: &str) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: idx.to_string(),
        source: format!("unsupported column type {type_name} in binary format").into(),
    }
}

/// NUMERIC as a float; values beyond `f64` range keep their exact text.
fn decimal_to_value(v: Decimal) -> Value {
    v.to_f64()
        .map(Value::Float)
        .unwrap_or_else(|| Value::Text(v.to_string()))
}

/// BYTEA in PostgreSQL's hex output format, e.g. `\x01ff`.
fn bytea_to_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(2 + bytes.len() * 2);
    text.push_str("\\x");
    for b in bytes {
        text.push_str(&format!("{b:02x}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn unreachable_params() -> PgConnectionParams {
        PgConnectionParams {
            host: "127.0.0.1".to_string(),
            // Port 1 is reserved and closed on test machines.
            port: 1,
            dbname: "qdb".to_string(),
            user: "admin".to_string(),
            password: "quest".to_string(),
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", unreachable_params());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("quest\""));
    }

    #[test]
    fn test_build_insert_uses_first_record_columns() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let records = vec![
            Record::new()
                .with("timestamp", ts)
                .with("device_id", "device_A")
                .with("temperature", 25.5),
            Record::new()
                .with("timestamp", ts)
                .with("device_id", "device_B")
                .with("temperature", 26.1),
        ];
        let columns: Vec<&str> = records[0].keys().collect();
        let builder = build_insert("my_metrics", &columns, &records);
        assert_eq!(
            builder.sql(),
            "INSERT INTO my_metrics (timestamp, device_id, temperature) VALUES ($1, $2, $3), ($4, $5, $6)"
        );
    }

    #[test]
    fn test_build_insert_ignores_extra_keys_in_later_records() {
        let records = vec![
            Record::new().with("a", 1i64),
            Record::new().with("a", 2i64).with("b", 3i64),
        ];
        let columns: Vec<&str> = records[0].keys().collect();
        let builder = build_insert("t", &columns, &records);
        assert_eq!(builder.sql(), "INSERT INTO t (a) VALUES ($1), ($2)");
    }

    #[tokio::test]
    async fn test_empty_write_does_not_connect() {
        let backend = PostgresBackend::new(unreachable_params());
        backend
            .write(&[], "my_metrics")
            .await
            .expect("empty write must be a no-op");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let backend = PostgresBackend::new(unreachable_params())
            .with_timeout(Duration::from_secs(5));
        let err = backend.read("SELECT 1").await.unwrap_err();
        assert_eq!(err.kind(), crate::error_handling::ErrorKind::Transport);

        let records = vec![Record::new().with("v", 1i64)];
        let err = backend.write(&records, "t").await.unwrap_err();
        assert_eq!(err.kind(), crate::error_handling::ErrorKind::Transport);
    }

    #[test]
    fn test_protocol() {
        assert_eq!(
            PostgresBackend::new(unreachable_params()).protocol(),
            Protocol::PostgresWire
        );
    }

    #[test]
    fn test_numeric_decodes_as_float() {
        assert_eq!(decimal_to_value(Decimal::new(15, 1)), Value::Float(1.5));
        assert_eq!(decimal_to_value(Decimal::new(-25, 0)), Value::Float(-25.0));
    }

    #[test]
    fn test_bytea_renders_as_hex() {
        assert_eq!(bytea_to_text(&[0x01, 0xff, 0x10]), "\\x01ff10");
        assert_eq!(bytea_to_text(&[]), "\\x");
    }

    #[test]
    fn test_unknown_binary_column_is_malformed_response() {
        let err = categorize_sqlx_error(unsupported_column_type(2, "INTERVAL"), SqlPhase::Read);
        assert!(matches!(
            err,
            RepositoryError::Query(QueryError::MalformedResponse(ref msg)) if msg.contains("INTERVAL")
        ));
    }
}
