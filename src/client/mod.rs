//! Blocking HTTP client for a remote storefront server.
//!
//! [`HttpTableClient`] implements [`TableApi`] over the JSON endpoints, so
//! code written against the trait runs unchanged in-process or remotely.
//! Error envelopes are mapped back onto [`Error`] variants.

use crate::models::{Page, Query, Record, Value};
use crate::services::{TableApi, identity};
use crate::{Error, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response envelope shared by all table endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// HTTP implementation of [`TableApi`].
#[derive(Debug, Clone)]
pub struct HttpTableClient {
    base_url: String,
    client: Client,
}

impl HttpTableClient {
    /// Creates a client for the server at `base_url`
    /// (e.g. `http://127.0.0.1:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::OperationFailed {
                operation: "build_http_client".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists the server's tables with their record counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] on transport or decoding errors.
    pub fn tables(&self) -> Result<Vec<(String, usize)>> {
        #[derive(Deserialize)]
        struct TableCount {
            id: String,
            count: usize,
        }

        let url = format!("{}/tables", self.base_url);
        let response = self.client.get(&url).send().map_err(|e| transport_error(&url, &e))?;
        let counts: Vec<TableCount> = decode(response, "", None)?.unwrap_or_default();
        Ok(counts.into_iter().map(|t| (t.id, t.count)).collect())
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        table_id: &str,
        key: Option<&Value>,
        body: &serde_json::Value,
    ) -> Result<Option<T>> {
        let url = format!("{}/{path}/{table_id}", self.base_url);
        tracing::debug!(url = %url, "Sending table request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| transport_error(&url, &e))?;

        decode(response, table_id, key)
    }
}

/// Reads an envelope and maps failures onto [`Error`].
fn decode<T: DeserializeOwned>(
    response: reqwest::blocking::Response,
    table_id: &str,
    key: Option<&Value>,
) -> Result<Option<T>> {
    let status = response.status();
    let envelope: Envelope<T> = response.json().map_err(|e| Error::OperationFailed {
        operation: "decode_response".to_string(),
        cause: format!("status {status}: {e}"),
    })?;

    if status.is_success() && envelope.success {
        return Ok(envelope.data);
    }

    let message = envelope.error.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND if message == "Record not found" => {
            Error::RecordNotFound(key.map_or_else(String::new, ToString::to_string))
        },
        StatusCode::NOT_FOUND => Error::TableNotFound(table_id.to_string()),
        StatusCode::BAD_REQUEST => Error::InvalidInput(message),
        _ => Error::OperationFailed {
            operation: "table_request".to_string(),
            cause: format!("status {status}: {message}"),
        },
    })
}

fn transport_error(url: &str, e: &reqwest::Error) -> Error {
    Error::OperationFailed {
        operation: "http_request".to_string(),
        cause: format!("{url}: {e}"),
    }
}

fn missing_data(operation: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: "response carried no data".to_string(),
    }
}

impl TableApi for HttpTableClient {
    fn page(&self, table_id: &str, query: &Query) -> Result<Page> {
        let body = serde_json::to_value(query).map_err(|e| Error::OperationFailed {
            operation: "encode_query".to_string(),
            cause: e.to_string(),
        })?;
        self.post("table", table_id, None, &body)?
            .ok_or_else(|| missing_data("page"))
    }

    fn create(&mut self, table_id: &str, record: Record) -> Result<Record> {
        self.post("table/create", table_id, None, &record.into())?
            .ok_or_else(|| missing_data("create"))
    }

    fn update(&mut self, table_id: &str, patch: Record) -> Result<Record> {
        let key = identity::extract_key(&patch).ok().map(|(_, key)| key);
        self.post("table/update", table_id, key.as_ref(), &patch.into())?
            .ok_or_else(|| missing_data("update"))
    }

    fn delete(&mut self, table_id: &str, key: &Value) -> Result<()> {
        let field = identity::CANONICAL_KEY;
        let body = json!({ field: key });
        self.post::<serde_json::Value>("table/delete", table_id, Some(key), &body)
            .map(|_| ())
    }
}
