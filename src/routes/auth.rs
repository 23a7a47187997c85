use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::routes::session::session_id;
use crate::services::auth_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// POST /api/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    info!("POST /api/register");
    let created = auth_service::register(&state.pool, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    info!("POST /api/login");
    Ok(Json(auth_service::login(&state.pool, req).await?))
}

/// POST /api/logout
/// Drops the broker session named in the request, if any
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(id) = session_id(&headers) {
        if state.sessions.remove(id) {
            info!("Closed session {}", id);
        }
    }
    Json(json!({ "message": "Logged out successfully" }))
}
