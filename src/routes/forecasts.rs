use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{BatchForecast, ForecastEntry, TimeSeriesRequest};
use crate::services::stock_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/get-time-series", post(get_time_series))
}

/// POST /api/get-time-series
/// Recent history plus projected closes for each requested ticker.
/// Results are keyed by each symbol exactly as sent; surrounding
/// whitespace is only dropped for the lookup.
async fn get_time_series(
    State(state): State<AppState>,
    Json(req): Json<TimeSeriesRequest>,
) -> Result<Json<BatchForecast>, AppError> {
    info!("POST /api/get-time-series - {} tickers", req.tickers.len());

    let mut result = BatchForecast::new();
    let mut accepted: Vec<(String, String)> = Vec::with_capacity(req.tickers.len());
    for raw in req.tickers {
        let ticker = raw.trim().to_string();
        match stock_service::validate_ticker(&ticker) {
            Ok(()) => accepted.push((raw, ticker)),
            Err(e) => {
                result.insert(raw, ForecastEntry::Failed { error: e.client_message() });
            }
        }
    }

    let tickers: Vec<String> = accepted.iter().map(|(_, ticker)| ticker.clone()).collect();
    let forecasts = state
        .forecaster
        .forecast_batch(state.market_data.as_ref(), &tickers)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for (raw, ticker) in accepted {
        if let Some(entry) = forecasts.get(&ticker) {
            result.insert(raw, entry.clone());
        }
    }

    Ok(Json(result))
}
