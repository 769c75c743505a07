//! 审核后台路由。

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use application::ApplicationDto;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct RejectPayload {
    reason: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/applications", get(list_pending_applications))
        .route(
            "/admin/applications/{application_id}/approve",
            post(approve_application),
        )
        .route(
            "/admin/applications/{application_id}/reject",
            post(reject_application),
        )
}

async fn list_pending_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationDto>>, ApiError> {
    let dtos = state.moderation_service.list_pending().await?;
    Ok(Json(dtos))
}

async fn approve_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ApplicationDto>, ApiError> {
    let dto = state.moderation_service.approve(application_id).await?;
    Ok(Json(dto))
}

async fn reject_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<ApplicationDto>, ApiError> {
    let dto = state
        .moderation_service
        .reject(application_id, payload.reason)
        .await?;
    Ok(Json(dto))
}
