//! HTTP backend.
//!
//! Writes POST the encoded line protocol as a multipart file upload to the
//! store's bulk-import endpoint. The store parses the payload and applies what
//! it can: malformed lines are dropped on the server and never reported, so a
//! successful call does not mean every row was persisted.
//!
//! Reads GET the query endpoint and zip the returned `columns` and `dataset`
//! arrays into records, keeping the response's column order.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;

use crate::config::{DEFAULT_IMPORT_PATH, DEFAULT_QUERY_PATH, IMPORT_FILE_NAME, IMPORT_PART_NAME};
use crate::error_handling::{
    categorize_reqwest_error, InitializationError, QueryError, RepositoryError, TransportError,
};
use crate::initialization::init_client;
use crate::line_protocol;
use crate::record::{Record, Value};
use crate::repository::{Protocol, Repository};

/// Query endpoint response document.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    /// Absent when the statement produced no result set.
    columns: Option<Vec<ColumnDescriptor>>,
    #[serde(default)]
    dataset: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ColumnDescriptor {
    name: String,
    #[serde(rename = "type", default)]
    column_type: Option<String>,
}

/// Repository backend speaking the store's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    import_path: String,
    query_path: String,
}

impl HttpBackend {
    /// Creates a backend for `http://{host}:{port}`.
    pub fn new(host: &str, port: u16) -> Result<Self, InitializationError> {
        Self::from_base_url(&base_url_for(host, port), None)
    }

    /// Creates a backend for an explicit base URL, e.g. `https://db.example:9000`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::InvalidBaseUrl` if `base_url` does not
    /// parse, or `InitializationError::HttpClientError` if the client cannot
    /// be built.
    pub fn from_base_url(
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, InitializationError> {
        Url::parse(base_url).map_err(|_| InitializationError::InvalidBaseUrl(base_url.to_string()))?;
        let client = init_client(timeout)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            import_path: DEFAULT_IMPORT_PATH.to_string(),
            query_path: DEFAULT_QUERY_PATH.to_string(),
        })
    }

    /// Overrides the bulk-import path (default `/imp`).
    pub fn with_import_path(mut self, path: impl Into<String>) -> Self {
        self.import_path = path.into();
        self
    }

    /// Overrides the query path (default `/exp`).
    pub fn with_query_path(mut self, path: impl Into<String>) -> Self {
        self.query_path = path.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Repository for HttpBackend {
    async fn write(&self, records: &[Record], table: &str) -> Result<(), RepositoryError> {
        if records.is_empty() {
            return Ok(());
        }

        let payload = line_protocol::encode(table, records);
        let url = self.endpoint(&self.import_path);
        debug!(
            "Posting {} lines ({} bytes) to {url}",
            records.len(),
            payload.len()
        );

        let part = Part::text(payload)
            .file_name(IMPORT_FILE_NAME)
            .mime_str("text/plain")
            .map_err(categorize_reqwest_error)?;
        let form = Form::new().part(IMPORT_PART_NAME, part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(categorize_reqwest_error)?;
        ensure_success(response, &url).await?;
        Ok(())
    }

    async fn read(&self, query: &str) -> Result<Vec<Record>, RepositoryError> {
        let url = self.endpoint(&self.query_path);
        debug!("Querying {url}");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(categorize_reqwest_error)?;
        let response = ensure_success(response, &url).await?;
        let body = response.text().await.map_err(categorize_reqwest_error)?;

        let records = parse_query_response(&body)?;
        debug!("Query returned {} rows", records.len());
        Ok(records)
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}

/// Plain-HTTP base URL for `host:port`, bracketing IPv6 literals.
pub(crate) fn base_url_for(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{host}]:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

/// Turns a non-2xx response into `TransportError::HttpStatus`, keeping the
/// body for diagnostics.
async fn ensure_success(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("{url} answered {status}: {body}");
    Err(TransportError::HttpStatus {
        status,
        url: url.to_string(),
        body,
    }
    .into())
}

/// Parses a query response body into records.
///
/// Each dataset row is zipped with the column names; a row shorter or
/// longer than the column list is truncated to the shorter of the two.
fn parse_query_response(body: &str) -> Result<Vec<Record>, RepositoryError> {
    let document: QueryResponse = serde_json::from_str(body)
        .map_err(|e| QueryError::MalformedResponse(e.to_string()))?;
    let columns = document.columns.ok_or(QueryError::NoResultSet)?;

    let records = document
        .dataset
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(column, value)| {
                    let value = json_to_value(value, column.column_type.as_deref());
                    (column.name.clone(), value)
                })
                .collect::<Record>()
        })
        .collect();
    Ok(records)
}

fn json_to_value(value: serde_json::Value, column_type: Option<&str>) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => {
            if is_temporal(column_type) {
                if let Ok(ts) = DateTime::parse_from_rfc3339(&s) {
                    return Value::Timestamp(ts.with_timezone(&Utc));
                }
            }
            Value::Text(s)
        }
        other => Value::Text(other.to_string()),
    }
}

fn is_temporal(column_type: Option<&str>) -> bool {
    matches!(
        column_type.map(str::to_ascii_uppercase).as_deref(),
        Some("TIMESTAMP") | Some("DATE")
    )
}
