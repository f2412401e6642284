use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    extractors::CurrentAccount,
    password::{check_credentials, hash_password},
};
use crate::{
    accounts::model::{Account, NewAccount, Role},
    error::ApiError,
    state::AppState,
    validation::{
        validate_bio, validate_email, validate_experience, validate_hourly_rate, validate_name,
        validate_password, validate_phone, ValidationError,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

/// Validates registration input. The password hash is filled in afterwards.
fn new_account(payload: &RegisterRequest) -> Result<NewAccount, ApiError> {
    let name = validate_name(&payload.name)?;
    let email = validate_email(&payload.email)?;
    let phone = validate_phone(&payload.phone)?;

    let mut account = NewAccount {
        name,
        email,
        password_hash: String::new(),
        phone,
        role: payload.role,
        profession: None,
        city: None,
        bio: None,
        experience: None,
        hourly_rate: None,
    };

    match payload.role {
        Role::Client => {}
        Role::Artisan => {
            account.profession = Some(payload.profession.ok_or_else(|| {
                ValidationError::new("profession", "is required for artisan accounts")
            })?);
            account.city = Some(payload.city.ok_or_else(|| {
                ValidationError::new("city", "is required for artisan accounts")
            })?);
            account.bio = payload.bio.as_deref().map(validate_bio).transpose()?;
            account.experience = payload.experience.map(validate_experience).transpose()?;
            account.hourly_rate = payload.hourly_rate.map(validate_hourly_rate).transpose()?;
        }
        Role::Admin => {
            return Err(ValidationError::new("role", "must be either client or artisan").into());
        }
    }
    Ok(account)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    validate_password(&payload.password)?;
    let mut account = new_account(&payload)?;
    account.password_hash = hash_password(&payload.password)?;

    let user = state.accounts.insert(account).await.map_err(|e| {
        warn!(error = %e, "registration rejected");
        ApiError::from(e)
    })?;
    let token = state.keys.issue(user.id)?;

    info!(user_id = %user.id, role = ?user.role, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let email = validate_email(&payload.email)?;

    let user = state.accounts.find_by_email(&email).await?;
    let matches = check_credentials(
        &payload.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
    )?;
    let user = match user {
        Some(user) if matches => user,
        Some(user) => {
            warn!(user_id = %user.id, "login invalid password");
            return Err(ApiError::InvalidCredentials("invalid email or password"));
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::InvalidCredentials("invalid email or password"));
        }
    };

    if !user.is_active {
        warn!(user_id = %user.id, "login on deactivated account");
        return Err(ApiError::InvalidCredentials("your account has been deactivated"));
    }

    let token = state.keys.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse { token, user }))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentAccount(account): CurrentAccount) -> Json<Account> {
    Json(account)
}
