//! CRUD handlers shared by every [`Record`] table.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::db::Record;
use crate::db::ledger::{delete_owned, find_owned, list_owned};
use crate::db::models::Validate;
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::router::AppState;

/// `POST|GET {PATH}` and `GET|PATCH|DELETE {PATH}/{id}` for one record type.
pub fn routes<T: Record>(router: Router<AppState>) -> Router<AppState> {
    router
        .route(T::PATH, post(create::<T>).get(list::<T>))
        .route(
            &format!("{}/{{id}}", T::PATH),
            get(fetch::<T>).patch(update::<T>).delete(remove::<T>),
        )
}

pub async fn create<T: Record>(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<T::Create>,
) -> Result<(StatusCode, Json<T>), AppError> {
    input.validate().map_err(AppError::Validation)?;
    let mut conn = state.provider.connect().await?;
    auth.account(&mut conn).await?;
    let id = T::insert(&mut conn, auth.user_id(), input).await?;
    let row = find_owned::<T>(&mut conn, id, auth.user_id())
        .await?
        .ok_or_else(not_found::<T>)?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn list<T: Record>(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<T>>, AppError> {
    let mut conn = state.provider.connect().await?;
    auth.account(&mut conn).await?;
    Ok(Json(list_owned::<T>(&mut conn, auth.user_id()).await?))
}

pub async fn fetch<T: Record>(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<T>, AppError> {
    let mut conn = state.provider.connect().await?;
    auth.account(&mut conn).await?;
    find_owned::<T>(&mut conn, id, auth.user_id())
        .await?
        .map(Json)
        .ok_or_else(not_found::<T>)
}

pub async fn update<T: Record>(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<T::Patch>,
) -> Result<Json<T>, AppError> {
    patch.validate().map_err(AppError::Validation)?;
    let mut conn = state.provider.connect().await?;
    auth.account(&mut conn).await?;
    T::update(&mut conn, id, auth.user_id(), patch).await?;
    find_owned::<T>(&mut conn, id, auth.user_id())
        .await?
        .map(Json)
        .ok_or_else(not_found::<T>)
}

pub async fn remove<T: Record>(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<T>, AppError> {
    let mut conn = state.provider.connect().await?;
    auth.account(&mut conn).await?;
    delete_owned::<T>(&mut conn, id, auth.user_id())
        .await?
        .map(Json)
        .ok_or_else(not_found::<T>)
}

fn not_found<T: Record>() -> AppError {
    AppError::NotFound(format!("{} not found", T::NAME))
}
