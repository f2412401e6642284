use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    aggregator::Aggregate,
    dto::{ApprovalRequest, CreateReviewRequest},
    model::{Review, ReviewListing},
};
use crate::{
    accounts::model::Role,
    auth::{
        extractors::AdminIdentity,
        gate::{self, Identity},
    },
    error::ApiError,
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review).get(list_all))
        .route("/reviews/:id/approval", put(set_approval))
        .route("/reviews/:id", delete(delete_review))
        .route("/reviews/artisan/:artisan_id", get(list_for_artisan))
        .route("/artisans/:id/reputation/recompute", post(recompute_reputation))
}

#[instrument(skip_all)]
pub async fn create_review(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    gate::authorize(&identity, &[Role::Client])?;
    let Json(payload) = payload?;
    let review = state
        .ledger
        .create(identity.id, payload.artisan_id, payload.rating, &payload.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip_all)]
pub async fn set_approval(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Result<Json<Review>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    Ok(Json(state.ledger.set_approval(id, payload.is_approved).await?))
}

#[instrument(skip_all)]
pub async fn delete_review(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<(), ApiError> {
    let Path(id) = id?;
    state.ledger.delete(id, &identity).await
}

#[instrument(skip_all)]
pub async fn list_for_artisan(
    State(state): State<AppState>,
    artisan_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<ReviewListing>>, ApiError> {
    let Path(artisan_id) = artisan_id?;
    Ok(Json(state.ledger.list_by_artisan(artisan_id).await?))
}

#[instrument(skip_all)]
pub async fn list_all(
    State(state): State<AppState>,
    _admin: AdminIdentity,
) -> Result<Json<Vec<ReviewListing>>, ApiError> {
    Ok(Json(state.ledger.list_all().await?))
}

#[instrument(skip_all)]
pub async fn recompute_reputation(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Aggregate>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.ledger.recompute(id).await?))
}
