use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{CompareRequest, ComparisonResult, HoldingMetrics, StockDetail, StockDetailQuery};
use crate::routes::session::AngelSession;
use crate::services::stock_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(get_stocks))
        .route("/compare-stocks", post(compare_stocks))
        .route("/stock/:ticker", get(get_stock))
}

/// GET /api/stocks
/// Angel One holdings enriched with fundamentals and P&L
async fn get_stocks(
    State(state): State<AppState>,
    AngelSession(session): AngelSession,
) -> Result<Json<Vec<HoldingMetrics>>, AppError> {
    info!("GET /api/stocks (session {})", session.id);

    let holdings = state.angel.holdings(&session).await?;
    let metrics = stock_service::portfolio_metrics(state.market_data.as_ref(), &holdings).await;

    Ok(Json(metrics))
}

/// POST /api/compare-stocks
async fn compare_stocks(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<ComparisonResult>, AppError> {
    let normalize = |t: Option<String>| t.map(|t| t.trim().to_uppercase()).filter(|t| !t.is_empty());
    let (ticker1, ticker2) = match (normalize(req.ticker1), normalize(req.ticker2)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(AppError::Validation("Please provide both ticker symbols".to_string())),
    };
    stock_service::validate_ticker(&ticker1)?;
    stock_service::validate_ticker(&ticker2)?;

    info!("POST /api/compare-stocks - {} vs {}", ticker1, ticker2);
    let result = stock_service::compare_stocks(state.market_data.as_ref(), &ticker1, &ticker2).await;

    Ok(Json(result))
}

/// GET /api/stock/:ticker?interval=1d&period=max
async fn get_stock(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<StockDetailQuery>,
) -> Result<Json<StockDetail>, AppError> {
    info!("GET /api/stock/{}", ticker);

    let detail = stock_service::stock_detail(
        state.market_data.as_ref(),
        ticker.trim(),
        query.interval.as_deref(),
        query.period.as_deref(),
    )
    .await?;

    Ok(Json(detail))
}
