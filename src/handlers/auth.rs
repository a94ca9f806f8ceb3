use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use serde_json::json;

use super::access::BearerToken;
use super::{ApiJson, ApiResponse};
use crate::db;
use crate::errors::AppResult;
use crate::models::{Credentials, NewUser};
use crate::services::users;
use crate::state::AppState;

// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewUser>,
) -> AppResult<Response> {
    let user = users::register(&state.db, state.mailer.as_ref(), payload).await?;
    Ok(ApiResponse::created(user))
}

// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> AppResult<Response> {
    let user = {
        let conn = db::lock(&state.db)?;
        users::authenticate(&conn, &credentials.email, &credentials.password)?
    };
    let token = state.tokens.issue(&user)?;

    tracing::info!(user_id = %user.id, "login");
    Ok(ApiResponse::created(json!({ "token": token })))
}

// GET /api/v1/auth/refresh-token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> AppResult<Response> {
    let token = state.tokens.refresh(&token)?;
    Ok(ApiResponse::created(json!({ "token": token })))
}
