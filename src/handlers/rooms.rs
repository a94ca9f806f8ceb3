use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::access::{AdminOnly, AnyRole, ApproverOnly, Authorized, Staff};
use super::{ApiJson, ApiResponse};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{NewRoom, RoomPatch};
use crate::services::rooms;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsQuery {
    pub room_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

// POST /api/v1/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminOnly>,
    ApiJson(payload): ApiJson<NewRoom>,
) -> AppResult<Response> {
    let mut conn = db::lock(&state.db)?;
    Ok(ApiResponse::created(rooms::create(&mut conn, payload)?))
}

// GET /api/v1/rooms?roomType=
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
    Query(query): Query<RoomsQuery>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    match query.room_type.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(room_type) => Ok(ApiResponse::ok(rooms::get_by_type(&conn, room_type)?)),
        None => Ok(ApiResponse::ok(rooms::list_all(&conn)?)),
    }
}

// GET /api/v1/rooms/:id
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(rooms::get_by_id(&conn, &id)?))
}

// GET /api/v1/rooms/status?status=
pub async fn list_by_status(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AnyRole>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Response> {
    let status = query
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("status can't be empty".to_string()))?;

    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(rooms::list_by_status(&conn, &status)?))
}

// PUT /api/v1/rooms/:id
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<RoomPatch>,
) -> AppResult<Response> {
    let mut conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(rooms::update(&mut conn, &id, &patch)?))
}

// PUT /api/v1/rooms/:id/status
pub async fn release_room(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<ApproverOnly>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(rooms::change_status(&conn, &id)?))
}

// DELETE /api/v1/rooms/:id
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminOnly>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let mut conn = db::lock(&state.db)?;
    rooms::delete(&mut conn, &id)?;
    Ok(ApiResponse::ok(format!("room with id {id} deleted")))
}
