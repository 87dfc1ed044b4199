use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::db::models::{DbUser, UserCreate, UserPatch, Validate};
use crate::db::users;
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::handlers::auth::create_user;
use crate::middleware::AuthUser;
use crate::router::AppState;
use crate::service::password::hash_password;

/// POST /users -> register without issuing a token.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<DbUser>), AppError> {
    input.validate().map_err(AppError::Validation)?;
    let mut conn = state.provider.connect().await?;
    let user = create_user(&mut conn, &input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn fetch(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DbUser>, AppError> {
    auth.ensure_self(id)?;
    let mut conn = state.provider.connect().await?;
    users::find_by_id(&mut conn, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<DbUser>, AppError> {
    auth.ensure_self(id)?;
    patch.validate().map_err(AppError::Validation)?;

    let password_hash = patch.password.as_deref().map(hash_password);
    let mut conn = state.provider.connect().await?;
    users::update(&mut conn, id, &patch, password_hash.as_deref()).await?;
    users::find_by_id(&mut conn, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DbUser>, AppError> {
    auth.ensure_self(id)?;
    let mut conn = state.provider.connect().await?;
    users::delete(&mut conn, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found or nothing deleted".to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}
