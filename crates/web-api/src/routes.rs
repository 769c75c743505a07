use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::services::{ListingQuery, SubmitApplicationRequest};
use application::{ApplicationDto, BalanceDto, CategoryDto, ListingDto};
use domain::{ListingKind, ListingKindTag};

use crate::{admin_routes, error::ApiError, payment_routes, state::AppState};

#[derive(Debug, Deserialize)]
struct ListingsQuery {
    category_id: Option<Uuid>,
    kind: Option<ListingKindTag>,
}

#[derive(Debug, Deserialize)]
struct SubmitApplicationPayload {
    applicant_id: Uuid,
    category_id: Uuid,
    kind: ListingKind,
    name: String,
    url: String,
    description: Option<String>,
    image: Option<String>,
    edit_of: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct PromoteTopPayload {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct PromoteUltraTopPayload {
    user_id: Uuid,
    duration_days: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list_listings))
        .route("/listings/{listing_id}", get(get_listing))
        .route("/listings/{listing_id}/promote-top", post(promote_top))
        .route(
            "/listings/{listing_id}/promote-ultra-top",
            post(promote_ultra_top),
        )
        .route("/categories", get(list_categories))
        .route("/applications", post(submit_application))
        .route("/users/{user_id}/balance", get(get_balance))
        .merge(payment_routes::routes())
        .merge(admin_routes::routes())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<Vec<ListingDto>>, ApiError> {
    let dtos = state
        .listing_service
        .list(ListingQuery {
            category_id: query.category_id,
            kind: query.kind,
        })
        .await?;

    Ok(Json(dtos))
}

async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<ListingDto>, ApiError> {
    let dto = state.listing_service.get(listing_id).await?;
    Ok(Json(dto))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    let dtos = state.listing_service.list_categories().await?;
    Ok(Json(dtos))
}

async fn submit_application(
    State(state): State<AppState>,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<(StatusCode, Json<ApplicationDto>), ApiError> {
    let dto = state
        .submission_service
        .submit(SubmitApplicationRequest {
            applicant_id: payload.applicant_id,
            category_id: payload.category_id,
            kind: payload.kind,
            channel_name: payload.name,
            channel_url: payload.url,
            description: payload.description,
            channel_image: payload.image,
            edit_of: payload.edit_of,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn promote_top(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(payload): Json<PromoteTopPayload>,
) -> Result<Json<ListingDto>, ApiError> {
    let dto = state
        .promotion_service
        .promote_top(listing_id, payload.user_id)
        .await?;

    Ok(Json(dto))
}

async fn promote_ultra_top(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(payload): Json<PromoteUltraTopPayload>,
) -> Result<Json<ListingDto>, ApiError> {
    let dto = state
        .promotion_service
        .promote_ultra_top(listing_id, payload.user_id, payload.duration_days)
        .await?;

    Ok(Json(dto))
}

async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceDto>, ApiError> {
    let dto = state.payment_service.balance_of(user_id).await?;
    Ok(Json(dto))
}
