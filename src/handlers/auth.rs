use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::info;

use crate::db::models::{DbUser, LoginRequest, UserCreate, Validate};
use crate::db::users;
use crate::error::AppError;
use crate::handlers::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::router::AppState;
use crate::service::password::{hash_password, verify_password};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: DbUser,
    pub auth: String,
}

/// POST /auth/signup -> create an account and return a session token for it.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    input.validate().map_err(AppError::Validation)?;

    let mut conn = state.provider.connect().await?;
    let user = create_user(&mut conn, &input).await?;
    let auth = state.jwt.issue(&user)?;

    info!(user_id = user.id, "account created");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, auth })))
}

/// POST /auth/login -> exchange a username (or email) and password for a token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut conn = state.provider.connect().await?;
    let user = users::find_by_login(&mut conn, &input.username_or_email)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("User not found with given email or username".to_string())
        })?;

    if !verify_password(&input.password, &user.password) {
        return Err(AppError::Unauthorized(
            "Wrong password for given username or email",
        ));
    }

    let auth = state.jwt.issue(&user)?;
    Ok(Json(AuthResponse { user, auth }))
}

/// GET /auth/me -> the user behind the presented token.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DbUser>, AppError> {
    let mut conn = state.provider.connect().await?;
    Ok(Json(auth.account(&mut conn).await?))
}

pub(crate) async fn create_user(
    conn: &mut sqlx::MySqlConnection,
    input: &UserCreate,
) -> Result<DbUser, AppError> {
    let id = users::insert(
        conn,
        &input.username,
        &input.email,
        &hash_password(&input.password),
    )
    .await?;
    users::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
