use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{ChatReply, ChatRequest, RecommendationRequest};
use crate::services::recommendation_service::{self, RecommendationOutcome};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations))
        .route("/chat", post(chat))
}

/// POST /api/recommendations
/// Same-sector alternatives for the given holdings
async fn recommendations(
    State(state): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationOutcome>, AppError> {
    let stocks: Vec<String> = req
        .stocks
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if stocks.is_empty() {
        return Err(AppError::Validation("Please provide a list of stocks".to_string()));
    }
    info!("POST /api/recommendations - {} stocks", stocks.len());

    let outcome = recommendation_service::recommend_alternatives(&state.llm, &stocks)
        .await
        .map_err(|e| {
            error!("Recommendation request failed: {}", e);
            AppError::from(e)
        })?;

    Ok(Json(outcome))
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No input provided".to_string()))?;
    info!("POST /api/chat ({} chars)", message.len());

    let reply = state.llm.chat(&message).await?;
    Ok(Json(ChatReply { reply }))
}
