use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ArtisanQuery, UpdateProfileRequest, UpdateStatusRequest},
    model::{Account, ArtisanStats, ProfileUpdate},
};
use crate::{
    auth::extractors::{AdminIdentity, CurrentAccount},
    error::ApiError,
    state::AppState,
    validation::{
        validate_bio, validate_experience, validate_hourly_rate, validate_name, validate_phone,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .route("/users", get(list_users))
        .route("/users/:id/status", put(set_status))
        .route("/users/:id", delete(delete_user))
}

pub fn artisan_routes() -> Router<AppState> {
    Router::new()
        .route("/artisans", get(list_artisans))
        .route("/artisans/stats/overview", get(artisan_stats))
        .route("/artisans/:id", get(get_artisan))
}

/// Validates the fields present in the request. Artisan-only fields are
/// dropped for other roles.
fn profile_update(account: &Account, req: UpdateProfileRequest) -> Result<ProfileUpdate, ApiError> {
    let mut update = ProfileUpdate {
        name: req.name.as_deref().map(validate_name).transpose()?,
        phone: req.phone.as_deref().map(validate_phone).transpose()?,
        ..ProfileUpdate::default()
    };
    if account.is_artisan() {
        update.bio = req.bio.as_deref().map(validate_bio).transpose()?;
        update.experience = req.experience.map(validate_experience).transpose()?;
        update.hourly_rate = req.hourly_rate.map(validate_hourly_rate).transpose()?;
        update.profession = req.profession;
        update.city = req.city;
    }
    Ok(update)
}

#[instrument(skip_all)]
pub async fn get_profile(CurrentAccount(account): CurrentAccount) -> Json<Account> {
    Json(account)
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(payload) = payload?;
    let update = profile_update(&account, payload)?;
    let updated = state
        .accounts
        .update_profile(account.id, update)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!(user_id = %account.id, "profile updated");
    Ok(Json(updated))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminIdentity,
) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.accounts.list_all().await?))
}

#[instrument(skip_all)]
pub async fn set_status(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let account = state
        .accounts
        .set_active(id, payload.is_active)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!(admin_id = %admin.id, user_id = %id, is_active = payload.is_active, "account status changed");
    Ok(Json(account))
}

#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<(), ApiError> {
    let Path(id) = id?;
    if !state.accounts.delete(id).await? {
        warn!(user_id = %id, "delete of unknown account");
        return Err(ApiError::NotFound("user"));
    }
    info!(admin_id = %admin.id, user_id = %id, "account deleted");
    Ok(())
}

#[instrument(skip_all)]
pub async fn list_artisans(
    State(state): State<AppState>,
    query: Result<Query<ArtisanQuery>, QueryRejection>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    Ok(Json(state.accounts.list_artisans(&filter).await?))
}

#[instrument(skip_all)]
pub async fn get_artisan(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Account>, ApiError> {
    let Path(id) = id?;
    state
        .accounts
        .find_artisan(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("artisan"))
}

#[instrument(skip_all)]
pub async fn artisan_stats(State(state): State<AppState>) -> Result<Json<ArtisanStats>, ApiError> {
    Ok(Json(state.accounts.artisan_stats().await?))
}
