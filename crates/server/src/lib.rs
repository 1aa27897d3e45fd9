#![forbid(unsafe_code)]

//! HTTP surface for the roadmap document: version, snapshot, diff and batch update.
//!
//! Each request opens its own store on a blocking worker; all coordination between requests
//! happens in the database. The schema is installed once by [`serve`] before the listener binds.

pub mod config;
mod error;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorResponse};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use roadmap_core::{
    BatchOutcome, BatchRequest, Diff, FailureKind, Snapshot, UpdateResponse, VersionInfo,
};
use roadmap_storage::{SqliteStore, StoreError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};

#[derive(Clone, Debug)]
pub struct AppState {
    storage_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: Arc::new(storage_dir.into()),
        }
    }

    async fn with_store<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteStore) -> Result<T, StoreError> + Send + 'static,
    {
        let storage_dir = Arc::clone(&self.storage_dir);
        tokio::task::spawn_blocking(move || {
            let mut store = SqliteStore::open(storage_dir.as_path())?;
            work(&mut store)
        })
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .map_err(ApiError::from)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/data", get(snapshot_handler).put(update_handler))
        .route("/api/v1/data/diff/{from_version}", get(diff_handler))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[instrument(skip(state))]
async fn version_handler(State(state): State<AppState>) -> Result<Json<VersionInfo>, ApiError> {
    let version = state.with_store(|store| store.current_version()).await?;
    Ok(Json(VersionInfo { version }))
}

#[instrument(skip(state))]
async fn snapshot_handler(State(state): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = state.with_store(|store| store.snapshot()).await?;
    Ok(Json(snapshot))
}

#[instrument(skip(state))]
async fn diff_handler(
    State(state): State<AppState>,
    Path(from_version): Path<String>,
) -> Result<Json<Diff>, ApiError> {
    let baseline = from_version
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid fromVersion: {from_version}")))?;
    let diff = state
        .with_store(move |store| store.changes_since(baseline))
        .await?;
    Ok(Json(diff))
}

#[instrument(skip(state, payload))]
async fn update_handler(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UpdateResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    info!(
        version = request.version,
        upserts = request.upsert_count(),
        "batch received"
    );
    let outcome = state
        .with_store(move |store| Ok(store.apply_batch(&request)))
        .await?;

    Ok((outcome_status(&outcome), Json(outcome.to_response())))
}

/// Transport status for a batch outcome: stale versions are retriable, malformed input is not.
pub fn outcome_status(outcome: &BatchOutcome) -> StatusCode {
    match outcome {
        BatchOutcome::Success { .. } => StatusCode::OK,
        BatchOutcome::Conflict { .. } => StatusCode::CONFLICT,
        BatchOutcome::Failure {
            kind: FailureKind::Validation,
            ..
        } => StatusCode::BAD_REQUEST,
        BatchOutcome::Failure {
            kind: FailureKind::Store,
            ..
        } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn serve(config: ServerConfig) -> Result<(), std::io::Error> {
    let state = AppState::new(config.storage_dir.clone());
    // Schema install is the only write outside a batch; doing it here keeps request-time opens
    // read-only.
    state
        .with_store(|_| Ok(()))
        .await
        .map_err(std::io::Error::other)?;
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, storage_dir = %config.storage_dir.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
