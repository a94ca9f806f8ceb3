use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;

use super::access::{AdminOnly, AnyRole, Authorized};
use super::{ApiJson, ApiResponse};
use crate::db;
use crate::errors::AppResult;
use crate::models::{NewUser, Role, UserUpdate};
use crate::services::users;
use crate::state::AppState;

// POST /api/v1/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminOnly>,
    ApiJson(payload): ApiJson<NewUser>,
) -> AppResult<Response> {
    let user = users::register(&state.db, state.mailer.as_ref(), payload).await?;
    Ok(ApiResponse::created(user))
}

// GET /api/v1/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminOnly>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(users::list_all(&conn)?))
}

// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminOnly>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(users::get_by_id(&conn, &id)?))
}

// PUT /api/v1/users
// Updates the caller's own record.
pub async fn update_self(
    State(state): State<Arc<AppState>>,
    caller: Authorized<AnyRole>,
    ApiJson(changes): ApiJson<UserUpdate>,
) -> AppResult<Response> {
    let identity = caller.identity;
    let user = users::update(
        &state.db,
        &identity.user_id,
        changes,
        identity.role == Role::Admin,
    )?;
    Ok(ApiResponse::ok(user))
}

// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminOnly>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    users::delete(&conn, &id)?;
    Ok(ApiResponse::ok(format!("user with id {id} deleted")))
}
