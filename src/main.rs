use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use stockfolio::app;
use stockfolio::config::{AppConfig, MarketDataSource};
use stockfolio::external::angel_one::AngelOneClient;
use stockfolio::external::csv_history::CsvHistoryProvider;
use stockfolio::external::market_data::MarketDataProvider;
use stockfolio::external::upstox::UpstoxClient;
use stockfolio::external::yahoo_finance::YahooFinanceProvider;
use stockfolio::logging::{init_logging, LoggingConfig};
use stockfolio::services::forecasting_service::Forecaster;
use stockfolio::services::llm_service::{GeminiProvider, LlmService};
use stockfolio::services::session_store::SessionStore;
use stockfolio::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let market_data: Arc<dyn MarketDataProvider> = match &config.market_data {
        MarketDataSource::Yahoo => {
            tracing::info!("📊 Using market data provider: Yahoo Finance");
            Arc::new(YahooFinanceProvider::new(config.http_timeout))
        }
        MarketDataSource::Csv(dir) => {
            tracing::info!("📊 Using market data provider: CSV files in {}", dir.display());
            Arc::new(CsvHistoryProvider::new(dir.clone()))
        }
    };

    let forecaster = Forecaster::load(&config.forecast).with_context(|| {
        format!(
            "failed to load forecast artifacts ({}, {})",
            config.forecast.model_path.display(),
            config.forecast.scaler_path.display()
        )
    })?;

    let llm = match &config.gemini_api_key {
        Some(key) => {
            tracing::info!("🤖 Gemini enabled (model {})", config.gemini_model);
            let provider = GeminiProvider::new(key.clone(), config.gemini_model.clone(), config.http_timeout)?;
            LlmService::new(Arc::new(provider))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set; chat and recommendations are disabled");
            LlmService::disabled()
        }
    };

    let brokers = &config.brokers;
    let sessions = SessionStore::new();
    let state = AppState {
        pool,
        market_data,
        forecaster: Arc::new(forecaster),
        llm,
        angel: Arc::new(AngelOneClient::new(
            brokers.angel_base_url.clone(),
            brokers.angel_api_key.clone(),
            config.http_timeout,
        )),
        upstox: Arc::new(UpstoxClient::new(
            brokers.upstox_base_url.clone(),
            brokers.upstox_redirect_uri.clone(),
            config.http_timeout,
        )),
        sessions: sessions.clone(),
        session_ttl: chrono::Duration::hours(brokers.session_ttl_hours),
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired(chrono::Utc::now());
            if purged > 0 {
                tracing::info!("Purged {} expired broker sessions", purged);
            }
        }
    });

    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Stockfolio backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
