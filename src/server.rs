//!
//! routelists HTTP server
//! ----------------------
//! Axum-based JSON API over `RouteService`. This layer only translates requests
//! into service calls and results into `{"status": ...}` envelopes; every rule
//! about records, routes and search lives in the core modules.
//!
//! Responsibilities:
//! - Route registry endpoints (list, create, rename, remove).
//! - Record endpoints (list, add, update, delete, swap, reorder, transfer).
//! - Cross-route fuzzy search.
//! - Mapping `StoreError` through `AppError` to HTTP statuses.
//!
//! Store calls do blocking file I/O, so handlers run them on the blocking pool.

use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult, StoreResult};
use crate::search::parse_fields;
use crate::service::RouteService;
use crate::storage::{Position, Record, RecordPatch};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: RouteService,
}

type Reply = (StatusCode, Json<Value>);

#[derive(Deserialize)]
struct TitlePayload {
    title: String,
}

/// A position is either an offset (insert after it) or a token such as `start` or `fim`.
/// Any other JSON value (negative or fractional numbers, objects) means end.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionInput {
    Index(usize),
    Token(String),
    Other(Value),
}

impl From<PositionInput> for Position {
    fn from(p: PositionInput) -> Self {
        match p {
            PositionInput::Index(i) => Position::After(i),
            PositionInput::Token(t) => Position::parse(&t),
            PositionInput::Other(_) => Position::End,
        }
    }
}

#[derive(Deserialize)]
struct AddPayload {
    #[serde(default)]
    record: Record,
    #[serde(default)]
    position: Option<PositionInput>,
}

#[derive(Deserialize)]
struct UpdatePayload {
    patch: RecordPatch,
}

#[derive(Deserialize)]
struct SwapPayload {
    a: usize,
    b: usize,
}

#[derive(Deserialize)]
struct ReorderPayload {
    order: Vec<usize>,
}

#[derive(Deserialize)]
struct TransferPayload {
    destination: String,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    fields: Option<String>,
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn noop() -> Reply {
    (StatusCode::OK, Json(json!({"status": "noop"})))
}

fn error_reply(e: AppError) -> Reply {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(target: "routelists::server", "request failed: {}", e);
    } else {
        debug!(target: "routelists::server", "request rejected: {}", e);
    }
    (status, Json(json!({"status": "error", "code": e.code_str(), "message": e.message()})))
}

/// Run a service call on the blocking pool and map its error.
async fn call<T, F>(state: &AppState, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&RouteService) -> StoreResult<T> + Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| AppError::internal("task_failed".to_string(), format!("task failed: {e}")))?
        .map_err(AppError::from)
}

fn reply<T>(result: AppResult<T>, on_ok: impl FnOnce(T) -> Reply) -> Reply {
    match result {
        Ok(v) => on_ok(v),
        Err(e) => error_reply(e),
    }
}

fn changed(flag: bool) -> Reply {
    if flag { ok(json!({"status": "ok"})) } else { noop() }
}

async fn list_routes(State(state): State<AppState>) -> Reply {
    reply(call(&state, |s| s.list_routes()).await, |routes| ok(json!({"status": "ok", "routes": routes})))
}

async fn create_route(State(state): State<AppState>, Json(payload): Json<TitlePayload>) -> Reply {
    reply(call(&state, move |s| s.create_route(&payload.title)).await, |created| match created {
        Some(route) => (StatusCode::CREATED, Json(json!({"status": "ok", "route": route}))),
        None => noop(),
    })
}

async fn rename_route(State(state): State<AppState>, Path(id): Path<String>, Json(payload): Json<TitlePayload>) -> Reply {
    reply(call(&state, move |s| s.rename_route(&id, &payload.title)).await, |renamed| match renamed {
        Some(route) => ok(json!({"status": "ok", "route": route})),
        None => noop(),
    })
}

async fn remove_route(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    reply(call(&state, move |s| s.remove_route(&id)).await, changed)
}

async fn list_records(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    reply(call(&state, move |s| s.list_records(&id)).await, |records| ok(json!({"status": "ok", "records": records})))
}

async fn add_record(State(state): State<AppState>, Path(id): Path<String>, Json(payload): Json<AddPayload>) -> Reply {
    let position = payload.position.map(Position::from).unwrap_or_default();
    reply(call(&state, move |s| s.add_record(&id, payload.record, position)).await, |index| {
        (StatusCode::CREATED, Json(json!({"status": "ok", "index": index})))
    })
}

async fn update_record(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(payload): Json<UpdatePayload>,
) -> Reply {
    reply(call(&state, move |s| s.update_record(&id, index, &payload.patch)).await, changed)
}

async fn delete_record(State(state): State<AppState>, Path((id, index)): Path<(String, usize)>) -> Reply {
    reply(call(&state, move |s| s.delete_record(&id, index)).await, changed)
}

async fn swap_records(State(state): State<AppState>, Path(id): Path<String>, Json(payload): Json<SwapPayload>) -> Reply {
    reply(call(&state, move |s| s.swap_records(&id, payload.a, payload.b)).await, changed)
}

async fn reorder_records(State(state): State<AppState>, Path(id): Path<String>, Json(payload): Json<ReorderPayload>) -> Reply {
    reply(call(&state, move |s| s.reorder_records(&id, &payload.order)).await, |()| ok(json!({"status": "ok"})))
}

async fn transfer_record(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(payload): Json<TransferPayload>,
) -> Reply {
    reply(call(&state, move |s| s.transfer_record(&id, &payload.destination, index)).await, changed)
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Reply {
    let fields = params.fields.as_deref().map(parse_fields).unwrap_or_default();
    reply(call(&state, move |s| s.search(&params.q, &fields)).await, |hits| ok(json!({"status": "ok", "results": hits})))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "routelists ok" }))
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/{id}", put(rename_route).delete(remove_route))
        .route("/routes/{id}/records", get(list_records).post(add_record))
        .route("/routes/{id}/records/{index}", put(update_record).delete(delete_record))
        .route("/routes/{id}/records/{index}/transfer", post(transfer_record))
        .route("/routes/{id}/swap", post(swap_records))
        .route("/routes/{id}/reorder", post(reorder_records))
        .route("/search", get(search))
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let service = RouteService::from_config(&config)
        .with_context(|| format!("While opening data folder: {}", config.data_root.display()))?;
    let routes = service.list_routes().context("While loading the route registry")?;
    info!(
        target: "routelists::server",
        "data_root='{}' routes={} search_threshold={}",
        config.data_root.display(),
        routes.len(),
        config.search_threshold
    );

    let app = router(AppState { service });
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!(target: "routelists::server", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
