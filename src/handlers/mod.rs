pub mod access;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod rooms;
pub mod users;

use std::sync::Arc;

use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        (StatusCode::OK, Self::wrap(data)).into_response()
    }

    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Self::wrap(data)).into_response()
    }

    fn wrap(data: T) -> Json<Self> {
        Json(Self {
            message: "Ok".to_string(),
            data,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", get(auth::refresh_token))
        .route(
            "/booking",
            post(bookings::register_booking).get(bookings::list_bookings),
        )
        .route("/booking/approval", put(bookings::update_approval))
        .route("/booking/download", get(bookings::download_report))
        .route("/booking/send", post(bookings::send_report))
        .route("/booking/status/:status", get(bookings::list_by_status))
        .route("/booking/:id", get(bookings::get_booking))
        .route("/rooms", post(rooms::create_room).get(rooms::list_rooms))
        .route("/rooms/status", get(rooms::list_by_status))
        .route(
            "/rooms/:id",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route("/rooms/:id/status", put(rooms::release_room))
        .route(
            "/users",
            post(users::create_user)
                .get(users::list_users)
                .put(users::update_self),
        )
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .route("/health", get(health::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
