//! HTTP veneer over the dispatch engine's external operations.
//!
//! The transport is deliberately thin: every handler delegates straight to
//! [`roadhub_dispatch::DispatchEngine`], which owns all semantics.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use roadhub_core::error::{AppError, ErrorKind};
use roadhub_core::types::id::{ContractorId, JobId};

use crate::state::AppState;
use crate::ws;

/// Build the full router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/jobs/{id}/auto-assign", post(auto_assign))
        .route("/jobs/{id}/accept", post(accept))
        .route("/jobs/{id}/complete", post(complete))
        .route("/jobs/{id}/cancel", post(cancel))
        .route("/contractors/{id}/offline", post(contractor_offline))
        .route("/queues/stats", get(queue_stats))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `AppError` → HTTP response mapping.
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.0.kind.to_string(),
            "message": self.0.message,
        }));
        (status, body).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn auto_assign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.engine.auto_assign_job(JobId::from(id)).await?;
    Ok(Json(serde_json::json!({
        "success": outcome.success,
        "contractor_id": outcome.contractor_id,
    })))
}

/// Body for the acceptance and completion endpoints.
#[derive(Debug, Deserialize)]
struct ContractorAction {
    contractor_id: ContractorId,
}

async fn accept(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ContractorAction>,
) -> Result<impl IntoResponse, ApiError> {
    let accepted = state
        .engine
        .mark_accepted(JobId::from(id), body.contractor_id)
        .await?;
    Ok(Json(serde_json::json!({"accepted": accepted})))
}

async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ContractorAction>,
) -> Result<impl IntoResponse, ApiError> {
    let promoted = state
        .engine
        .on_job_completed(JobId::from(id), body.contractor_id)
        .await?;
    Ok(Json(serde_json::json!({
        "completed": true,
        "promoted_job_id": promoted.map(|j| j.id),
    })))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.on_job_cancelled(JobId::from(id)).await?;
    Ok(Json(serde_json::json!({"cancelled": true})))
}

async fn contractor_offline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let moved = state
        .engine
        .on_contractor_offline(ContractorId::from(id))
        .await?;
    Ok(Json(serde_json::json!({"reassigned": moved})))
}

async fn queue_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state.engine.queue_stats().await?;
    Ok(Json(report))
}
