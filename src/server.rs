//! HTTP transport for the task manager.
//!
//! `/tasks` maps the four HTTP verbs onto the manager's CRUD calls.
//! Successful responses are wrapped as `{ "value": ..., "time": ... }`;
//! failures come back as `{ "error": ... }` with 400 for validation errors
//! and 500 for everything else.

use crate::config::ServerConfig;
use crate::error::{Result, TrackerError};
use crate::tasks::{Task, TaskManager, TaskPatch};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
struct ServerState {
    manager: Arc<TaskManager>,
}

/// Successful response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub value: T,
    pub time: NaiveDateTime,
}

/// Result of an update or delete.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Matched {
    pub matched: bool,
}

/// Body of a delete request.
#[derive(Debug, Deserialize)]
struct DeleteBody {
    id: String,
}

fn envelope<T: Serialize>(value: T) -> Json<Envelope<T>> {
    Json(Envelope {
        value,
        time: Local::now().naive_local(),
    })
}

/// Maps tracker errors to HTTP responses.
struct ApiError(TrackerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(status = status.as_u16(), "request failed: {}", self.0);
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        Self(e)
    }
}

/// Build the router for the task API.
pub fn router(manager: Arc<TaskManager>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/tasks",
            get(read_tasks)
                .post(create_task)
                .put(update_task)
                .delete(delete_task),
        )
        .with_state(ServerState { manager })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn create_task(
    State(state): State<ServerState>,
    Json(task): Json<Task>,
) -> std::result::Result<Json<Envelope<Task>>, ApiError> {
    let created = state.manager.create(task)?;
    Ok(envelope(created))
}

async fn read_tasks(
    State(state): State<ServerState>,
) -> std::result::Result<Json<Envelope<Vec<Task>>>, ApiError> {
    Ok(envelope(state.manager.read()?))
}

async fn update_task(
    State(state): State<ServerState>,
    Json(patch): Json<TaskPatch>,
) -> std::result::Result<Json<Envelope<Matched>>, ApiError> {
    let matched = state.manager.update(patch)?;
    Ok(envelope(Matched { matched }))
}

async fn delete_task(
    State(state): State<ServerState>,
    Json(body): Json<DeleteBody>,
) -> std::result::Result<Json<Envelope<Matched>>, ApiError> {
    let matched = state.manager.delete(&body.id)?;
    Ok(envelope(Matched { matched }))
}

/// Running HTTP server.
pub struct TaskServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TaskServer {
    /// Bind to `{config.host}:{config.port}` (port `0` auto-assigns) and
    /// serve in a background task until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(
        manager: Arc<TaskManager>,
        config: &ServerConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        let addr = listener.local_addr()?;
        info!("task server listening on http://{addr}");

        let app = router(manager);
        let handle = tokio::spawn(async move {
            let shutdown = async move { cancel.cancelled().await };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("task server error: {e}");
            }
            info!("task server stopped");
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server task to finish (after cancellation).
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}
