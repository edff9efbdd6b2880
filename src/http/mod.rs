//! JSON-over-HTTP surface for the table service.
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `POST /table/{table_id}` | query | `{success, data: page}` |
//! | `POST /table/create/{table_id}` | record | `{success, data: record}` |
//! | `POST /table/update/{table_id}` | `{id, ...patch}` | `{success, data: record}` |
//! | `POST /table/delete/{table_id}` | `{id}` | `{success}` |
//! | `GET /tables` | | `{success, data: [{id, count}]}` |
//! | `GET /health` | | `{status: "ok"}` |
//!
//! Unknown tables and missing records answer `404` with
//! `{success: false, error}`; malformed bodies answer `400`.

use crate::models::{Query, Record, TableId};
use crate::services::{TableApi, TableService, identity};
use crate::{Error, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value as JsonValue, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// The service shared by all request handlers.
pub type SharedService = Arc<Mutex<TableService>>;

/// Builds the router over a shared service.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/table/{table_id}", post(page_records))
        .route("/table/create/{table_id}", post(create_record))
        .route("/table/update/{table_id}", post(update_record))
        .route("/table/delete/{table_id}", post(delete_record))
        .route("/tables", get(list_tables))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Runs the server on `addr` until interrupted, on a runtime of its own.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the runtime cannot start, the
/// address cannot be bound, or the server fails.
pub fn serve(addr: SocketAddr, service: TableService) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "bind".to_string(),
                cause: format!("{addr}: {e}"),
            })?;
        tracing::info!(%addr, "Storefront HTTP server listening");

        run(listener, Arc::new(Mutex::new(service)), shutdown_signal()).await
    })
}

/// Serves requests from `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the server fails.
pub async fn run(
    listener: tokio::net::TcpListener,
    service: SharedService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "serve".to_string(),
            cause: e.to_string(),
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn page_records(
    State(service): State<SharedService>,
    Path(table_id): Path<String>,
    body: String,
) -> Response {
    respond(handle_page(&service, &table_id, &body))
}

async fn create_record(
    State(service): State<SharedService>,
    Path(table_id): Path<String>,
    body: String,
) -> Response {
    respond(handle_create(&service, &table_id, &body))
}

async fn update_record(
    State(service): State<SharedService>,
    Path(table_id): Path<String>,
    body: String,
) -> Response {
    respond(handle_update(&service, &table_id, &body))
}

async fn delete_record(
    State(service): State<SharedService>,
    Path(table_id): Path<String>,
    body: String,
) -> Response {
    respond(handle_delete(&service, &table_id, &body))
}

async fn list_tables(State(service): State<SharedService>) -> Response {
    respond(lock(&service).map(|service| {
        let tables: Vec<JsonValue> = service
            .table_counts()
            .into_iter()
            .map(|(id, count)| json!({"id": id.as_str(), "count": count}))
            .collect();
        Some(JsonValue::Array(tables))
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

fn handle_page(service: &SharedService, table_id: &str, body: &str) -> Result<Option<JsonValue>> {
    ensure_table(table_id)?;
    let query: Query = if body.trim().is_empty() {
        Query::default()
    } else {
        let json = parse_body(body)?;
        if json.is_null() {
            Query::default()
        } else {
            serde_json::from_value(json)
                .map_err(|e| Error::InvalidInput(format!("malformed query: {e}")))?
        }
    };

    let page = lock(service)?.page(table_id, &query)?;
    Ok(Some(to_json(&page)?))
}

fn handle_create(service: &SharedService, table_id: &str, body: &str) -> Result<Option<JsonValue>> {
    ensure_table(table_id)?;
    let record = Record::from_json(parse_body(body)?)?;
    let created = lock(service)?.create(table_id, record)?;
    Ok(Some(created.into()))
}

fn handle_update(service: &SharedService, table_id: &str, body: &str) -> Result<Option<JsonValue>> {
    ensure_table(table_id)?;
    let patch = Record::from_json(parse_body(body)?)?;
    let updated = lock(service)?.update(table_id, patch)?;
    Ok(Some(updated.into()))
}

fn handle_delete(service: &SharedService, table_id: &str, body: &str) -> Result<Option<JsonValue>> {
    ensure_table(table_id)?;
    let request = Record::from_json(parse_body(body)?)?;
    let (_, key) = identity::extract_key(&request)?;
    lock(service)?.delete(table_id, &key)?;
    Ok(None)
}

/// Unknown tables answer 404 even when the body is also malformed.
fn ensure_table(table_id: &str) -> Result<()> {
    TableId::parse(table_id)
        .map(|_| ())
        .ok_or_else(|| Error::TableNotFound(table_id.to_string()))
}

fn parse_body(body: &str) -> Result<JsonValue> {
    if body.len() > MAX_REQUEST_BODY_SIZE {
        return Err(Error::InvalidInput(format!(
            "request body too large: {} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)",
            body.len()
        )));
    }
    serde_json::from_str(body).map_err(|e| Error::InvalidInput(format!("malformed JSON: {e}")))
}

fn lock(service: &SharedService) -> Result<MutexGuard<'_, TableService>> {
    service.lock().map_err(|e| Error::OperationFailed {
        operation: "lock_table_service".to_string(),
        cause: e.to_string(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<JsonValue> {
    serde_json::to_value(value).map_err(|e| Error::OperationFailed {
        operation: "serialize_response".to_string(),
        cause: e.to_string(),
    })
}

fn respond(result: Result<Option<JsonValue>>) -> Response {
    match result {
        Ok(Some(data)) => (StatusCode::OK, Json(json!({"success": true, "data": data}))).into_response(),
        Ok(None) => (StatusCode::OK, Json(json!({"success": true}))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Maps an error to its status code and envelope.
fn error_response(error: &Error) -> Response {
    let (status, message) = match error {
        Error::TableNotFound(_) => (StatusCode::NOT_FOUND, "Table not found".to_string()),
        Error::RecordNotFound(_) => (StatusCode::NOT_FOUND, "Record not found".to_string()),
        Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        Error::PersistenceFailure { .. } | Error::OperationFailed { .. } => {
            tracing::error!(error = %error, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        },
    };

    if status != StatusCode::INTERNAL_SERVER_ERROR {
        tracing::debug!(status = status.as_u16(), error = %error, "Request rejected");
    }

    (status, Json(json!({"success": false, "error": message}))).into_response()
}
