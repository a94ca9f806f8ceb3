use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;

use super::access::{AnyRole, ApproverOnly, Authorized, Staff};
use super::{ApiJson, ApiResponse};
use crate::db;
use crate::errors::AppResult;
use crate::models::{ApprovalRequest, BookingRequest, ReportRecipient};
use crate::services::bookings;
use crate::state::AppState;

// POST /api/v1/booking
pub async fn register_booking(
    State(state): State<Arc<AppState>>,
    caller: Authorized<AnyRole>,
    ApiJson(request): ApiJson<BookingRequest>,
) -> AppResult<Response> {
    let mut conn = db::lock(&state.db)?;
    let booking =
        bookings::register_booking(&mut conn, &caller.identity.user_id, &request.booking_details)?;
    Ok(ApiResponse::created(booking))
}

// PUT /api/v1/booking/approval
pub async fn update_approval(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<ApproverOnly>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> AppResult<Response> {
    let mut conn = db::lock(&state.db)?;
    let booking =
        bookings::update_approval(&mut conn, &request.booking_detail_id, &request.approval)?;
    Ok(ApiResponse::ok(booking))
}

// GET /api/v1/booking
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(bookings::list_all(&conn)?))
}

// GET /api/v1/booking/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    caller: Authorized<AnyRole>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(bookings::get_by_id(
        &conn,
        &id,
        &caller.identity,
    )?))
}

// GET /api/v1/booking/status/:status
pub async fn list_by_status(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
    Path(status): Path<String>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    Ok(ApiResponse::ok(bookings::list_by_status(&conn, &status)?))
}

// GET /api/v1/booking/download
pub async fn download_report(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
) -> AppResult<Response> {
    let conn = db::lock(&state.db)?;
    let bookings = bookings::generate_report(&conn, &state.config.report_path)?;
    Ok(ApiResponse::ok(bookings))
}

// POST /api/v1/booking/send
pub async fn send_report(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<Staff>,
    ApiJson(recipient): ApiJson<ReportRecipient>,
) -> AppResult<Response> {
    bookings::email_report(
        state.mailer.as_ref(),
        &state.config.report_path,
        &recipient.to,
    )
    .await?;
    Ok(ApiResponse::ok(format!("report sent to {}", recipient.to.trim())))
}
