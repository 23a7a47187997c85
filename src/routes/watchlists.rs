use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::db::{user_queries, watchlist_queries};
use crate::errors::AppError;
use crate::models::AddToWatchlistRequest;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addToWatchList", post(add_to_watchlist))
        .route("/watchlist/:user_id", get(list_watchlist))
}

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid user_id: {}", raw)))
}

/// POST /api/addToWatchList
async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(req): Json<AddToWatchlistRequest>,
) -> Result<Json<Value>, AppError> {
    let (user_id, symbol) = match (req.user_id, req.symbol) {
        (Some(u), Some(s)) if !u.trim().is_empty() && !s.trim().is_empty() => (u, s.trim().to_uppercase()),
        _ => return Err(AppError::Validation("Please provide user_id and symbol".to_string())),
    };
    let user_id = parse_user_id(&user_id)?;
    info!("POST /api/addToWatchList - {} for user {}", symbol, user_id);

    if !user_queries::exists(&state.pool, user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    watchlist_queries::add_symbol(&state.pool, user_id, &symbol)
        .await?
        .ok_or_else(|| AppError::Conflict("Symbol already in watchlist".to_string()))?;

    Ok(Json(json!({ "message": "Added to watchlist successfully" })))
}

/// GET /api/watchlist/:user_id
async fn list_watchlist(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    info!("GET /api/watchlist/{}", user_id);

    if !user_queries::exists(&state.pool, user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let symbols: Vec<String> = watchlist_queries::list_for_user(&state.pool, user_id)
        .await?
        .into_iter()
        .map(|entry| entry.symbol)
        .collect();

    Ok(Json(json!({ "user_id": user_id, "watchlist": symbols })))
}
