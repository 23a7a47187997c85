/// HTTP-level tests for the API router.
///
/// Everything outside the process is stubbed: market data comes from an
/// in-memory provider, the forecast model predicts a constant, the LLM is
/// disabled and the database pool connects lazily and is never touched.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use stockfolio::app::create_app;
use stockfolio::config::ForecastSettings;
use stockfolio::external::angel_one::AngelOneClient;
use stockfolio::external::market_data::{Candle, CompanyProfile, DailyClose, MarketDataError, MarketDataProvider};
use stockfolio::external::upstox::UpstoxClient;
use stockfolio::models::{Broker, BrokerSession};
use stockfolio::services::forecasting_service::Forecaster;
use stockfolio::services::llm_service::LlmService;
use stockfolio::services::scaler::MinMaxScaler;
use stockfolio::services::sequence_model::{ModelError, SequenceModel};
use stockfolio::services::session_store::SessionStore;
use stockfolio::state::AppState;

struct FlatModel;

impl SequenceModel for FlatModel {
    fn lookback(&self) -> usize {
        4
    }

    fn predict(&self, _window: &[f64]) -> Result<f64, ModelError> {
        Ok(0.5)
    }
}

struct FixtureProvider {
    closes: HashMap<String, Vec<f64>>,
}

impl FixtureProvider {
    fn new() -> Self {
        let mut closes = HashMap::new();
        closes.insert("AAPL".to_string(), vec![180.0, 181.5, 179.0, 182.0, 183.5, 184.0]);
        closes.insert("MSFT".to_string(), vec![410.0, 412.0, 409.5]);
        Self { closes }
    }
}

#[async_trait]
impl MarketDataProvider for FixtureProvider {
    async fn fetch_candles(&self, ticker: &str, _range: &str, _interval: &str) -> Result<Vec<Candle>, MarketDataError> {
        let closes = self
            .closes
            .get(ticker)
            .ok_or_else(|| MarketDataError::NotFound(format!("No price history for {}", ticker)))?;
        Ok(closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                date: Utc.with_ymd_and_hms(2024, 3, 1 + i as u32, 0, 0, 0).unwrap(),
                open: Some(close),
                high: Some(close),
                low: Some(close),
                close: Some(close),
                volume: Some(1_000.0),
            })
            .collect())
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        if !self.closes.contains_key(ticker) {
            return Err(MarketDataError::NotFound(ticker.to_string()));
        }
        Ok(CompanyProfile {
            symbol: ticker.to_string(),
            short_name: Some(format!("{} Inc.", ticker)),
            sector: Some("Technology".to_string()),
            current_price: Some(100.0),
            market_cap: Some(2.5e12),
            trailing_pe: Some(30.0),
            ..CompanyProfile::default()
        })
    }

    async fn fetch_daily_closes(&self, ticker: &str) -> Result<Vec<DailyClose>, MarketDataError> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        self.closes
            .get(ticker)
            .map(|closes| {
                closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| DailyClose {
                        date: start + chrono::Duration::days(i as i64),
                        close,
                    })
                    .collect()
            })
            .ok_or_else(|| MarketDataError::NotFound(format!("No price history for {}", ticker)))
    }
}

fn test_state() -> AppState {
    let settings = ForecastSettings {
        horizon_days: 3,
        past_days: 2,
        ..ForecastSettings::default()
    };
    let forecaster = Forecaster::new(
        Arc::new(FlatModel),
        MinMaxScaler::new(-5.0, 5.0, (0.0, 1.0)),
        &settings,
    );
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/stockfolio_test")
        .unwrap();

    AppState {
        pool,
        market_data: Arc::new(FixtureProvider::new()),
        forecaster: Arc::new(forecaster),
        llm: LlmService::disabled(),
        angel: Arc::new(AngelOneClient::new("http://127.0.0.1:9".into(), None, Duration::from_secs(1))),
        upstox: Arc::new(UpstoxClient::new(
            "https://api.upstox.com".into(),
            "http://localhost:3000/callback".into(),
            Duration::from_secs(1),
        )),
        sessions: SessionStore::new(),
        session_ttl: chrono::Duration::hours(8),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(create_app(test_state()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn test_time_series_mixes_series_and_errors() {
    let request = post_json(
        "/api/get-time-series",
        json!({ "tickers": ["AAPL", "NOPE", "bad ticker!"] }),
    );
    let (status, body) = send(create_app(test_state()), request).await;
    assert_eq!(status, StatusCode::OK);

    let aapl = body["AAPL"].as_array().expect("AAPL should be a series");
    // two history points plus three projected days
    assert_eq!(aapl.len(), 5);
    assert_eq!(aapl[0]["date"], "2024-03-05");
    assert_eq!(aapl[1]["date"], "2024-03-06");
    assert_eq!(aapl[1]["value"], 184.0);
    assert_eq!(aapl[4]["date"], "2024-03-09");
    assert!(aapl.iter().all(|p| p["value"].as_f64().unwrap() >= 0.01));

    assert!(body["NOPE"]["error"].as_str().unwrap().contains("NOPE"));
    assert!(body["bad ticker!"]["error"].is_string());
}

#[tokio::test]
async fn test_time_series_keys_symbols_as_sent() {
    let request = post_json(
        "/api/get-time-series",
        json!({ "tickers": [" AAPL ", "bad ticker!"] }),
    );
    let (status, body) = send(create_app(test_state()), request).await;
    assert_eq!(status, StatusCode::OK);

    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(body[" AAPL "].as_array().map(Vec::len), Some(5));
    assert!(body.get("AAPL").is_none());
    assert!(body["bad ticker!"]["error"].is_string());
}

#[tokio::test]
async fn test_time_series_is_reproducible() {
    let request = || post_json("/api/get-time-series", json!({ "tickers": ["MSFT", "AAPL"] }));
    let (_, first) = send(create_app(test_state()), request()).await;
    let (_, second) = send(create_app(test_state()), request()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_ticker_list_returns_empty_object() {
    let (status, body) = send(create_app(test_state()), post_json("/api/get-time-series", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_chat_is_unavailable_without_llm() {
    let (status, body) = send(create_app(test_state()), post_json("/api/chat", json!({ "message": "What is a P/E ratio?" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let (status, body) = send(create_app(test_state()), post_json("/api/chat", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No input provided");
}

#[tokio::test]
async fn test_recommendations_require_stocks() {
    let (status, body) = send(create_app(test_state()), post_json("/api/recommendations", json!({ "stocks": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a list of stocks");
}

#[tokio::test]
async fn test_holdings_require_a_broker_session() {
    let (status, _) = send(create_app(test_state()), get("/api/stocks")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/stocks")
        .header("x-session-id", uuid::Uuid::new_v4().to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(create_app(test_state()), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unknown broker session");
}

#[tokio::test]
async fn test_holdings_report_unconfigured_broker() {
    let state = test_state();
    let id = state.sessions.insert(BrokerSession::new(
        Broker::AngelOne,
        "jwt".into(),
        chrono::Duration::hours(1),
    ));

    let request = Request::builder()
        .uri("/api/stocks")
        .header("x-session-id", id.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(create_app(state), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("ANGEL_API_KEY"));
}

#[tokio::test]
async fn test_upstox_session_cannot_read_angel_holdings() {
    let state = test_state();
    let id = state.sessions.insert(BrokerSession::new(
        Broker::Upstox,
        "token".into(),
        chrono::Duration::hours(1),
    ));

    let request = Request::builder()
        .uri("/api/stocks")
        .header("x-session-id", id.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(create_app(state), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_drops_the_session() {
    let state = test_state();
    let sessions = state.sessions.clone();
    let id = sessions.insert(BrokerSession::new(
        Broker::AngelOne,
        "jwt".into(),
        chrono::Duration::hours(1),
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/api/logout")
        .header("x-session-id", id.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(create_app(state), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_compare_stocks_validation_and_result() {
    let (status, body) = send(create_app(test_state()), post_json("/api/compare-stocks", json!({ "ticker1": "AAPL" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide both ticker symbols");

    let (status, body) = send(
        create_app(test_state()),
        post_json("/api/compare-stocks", json!({ "ticker1": "aapl", "ticker2": "msft" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
}

#[tokio::test]
async fn test_stock_detail_rejects_unknown_interval() {
    let (status, body) = send(create_app(test_state()), get("/api/stock/AAPL?interval=7m")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid interval"));
}

#[tokio::test]
async fn test_stock_detail_for_unknown_symbol_is_not_found() {
    let (status, body) = send(create_app(test_state()), get("/api/stock/ZZZZ")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ZZZZ"));
}

#[tokio::test]
async fn test_watchlist_rejects_bad_user_id() {
    let (status, _) = send(
        create_app(test_state()),
        post_json("/api/addToWatchList", json!({ "user_id": "not-a-uuid", "symbol": "AAPL" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
