use std::sync::Arc;

use sqlx::PgPool;

use crate::external::angel_one::AngelOneClient;
use crate::external::market_data::MarketDataProvider;
use crate::external::upstox::UpstoxClient;
use crate::services::forecasting_service::Forecaster;
use crate::services::llm_service::LlmService;
use crate::services::session_store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub forecaster: Arc<Forecaster>,
    pub llm: LlmService,
    pub angel: Arc<AngelOneClient>,
    pub upstox: Arc<UpstoxClient>,
    pub sessions: SessionStore,
    pub session_ttl: chrono::Duration,
}
