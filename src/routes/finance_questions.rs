use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::db::finance_question_queries;
use crate::errors::AppError;
use crate::models::{CreateFinanceQuestion, FinanceQuestionCreated};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/finance_question", post(add_finance_question))
}

/// POST /api/finance_question
async fn add_finance_question(
    State(state): State<AppState>,
    Json(req): Json<CreateFinanceQuestion>,
) -> Result<(StatusCode, Json<FinanceQuestionCreated>), AppError> {
    let (question, answer) = match (req.question, req.answer) {
        (Some(q), Some(a)) if !q.trim().is_empty() && !a.trim().is_empty() => (q, a),
        _ => return Err(AppError::Validation("Please provide question and answer".to_string())),
    };
    info!("POST /api/finance_question");

    let saved = finance_question_queries::create(&state.pool, &question, &answer).await?;

    Ok((
        StatusCode::CREATED,
        Json(FinanceQuestionCreated {
            message: "Finance question added successfully".to_string(),
            finance_question_id: saved.id,
        }),
    ))
}
