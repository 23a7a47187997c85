use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

/// Where daily price history comes from
#[derive(Debug, Clone, PartialEq)]
pub enum MarketDataSource {
    Yahoo,
    Csv(PathBuf),
}

/// Settings for the forecast generator
#[derive(Debug, Clone)]
pub struct ForecastSettings {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub horizon_days: usize,
    pub past_days: usize,
    pub seed: u64,
    pub fetch_concurrency: usize,
}

/// Trading days per year times fifteen years
pub const DEFAULT_FORECAST_DAYS: usize = 252 * 15;

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifacts/bilstm_stock_model.json"),
            scaler_path: PathBuf::from("artifacts/scaler_diff.json"),
            horizon_days: DEFAULT_FORECAST_DAYS,
            past_days: DEFAULT_FORECAST_DAYS,
            seed: 42,
            fetch_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub angel_api_key: Option<String>,
    pub angel_base_url: String,
    pub upstox_base_url: String,
    pub upstox_redirect_uri: String,
    pub session_ttl_hours: i64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            angel_api_key: None,
            angel_base_url: "https://apiconnect.angelbroking.com".to_string(),
            upstox_base_url: "https://api.upstox.com".to_string(),
            upstox_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            session_ttl_hours: 12,
        }
    }
}

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub market_data: MarketDataSource,
    pub forecast: ForecastSettings,
    pub brokers: BrokerSettings,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub http_timeout: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {} ({})", key, raw, e)),
        Err(_) => Ok(default),
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr: SocketAddr = env_or("BIND_ADDR", "0.0.0.0:3000")
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let market_data = match env_or("PRICE_PROVIDER", "yahoo").to_lowercase().as_str() {
            "yahoo" => MarketDataSource::Yahoo,
            "csv" => MarketDataSource::Csv(PathBuf::from(env_or("CSV_DATA_DIR", "data"))),
            other => bail!("Invalid PRICE_PROVIDER: {}. Must be 'yahoo' or 'csv'", other),
        };

        let defaults = ForecastSettings::default();
        let forecast = ForecastSettings {
            model_path: env_opt("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            scaler_path: env_opt("SCALER_PATH").map(PathBuf::from).unwrap_or(defaults.scaler_path),
            horizon_days: env_parse("FORECAST_HORIZON_DAYS", defaults.horizon_days)?,
            past_days: env_parse("FORECAST_PAST_DAYS", defaults.past_days)?,
            seed: env_parse("FORECAST_SEED", defaults.seed)?,
            fetch_concurrency: env_parse("FORECAST_FETCH_CONCURRENCY", defaults.fetch_concurrency)?.max(1),
        };

        let broker_defaults = BrokerSettings::default();
        let brokers = BrokerSettings {
            angel_api_key: env_opt("ANGEL_API_KEY"),
            angel_base_url: env_or("ANGEL_BASE_URL", &broker_defaults.angel_base_url),
            upstox_base_url: env_or("UPSTOX_BASE_URL", &broker_defaults.upstox_base_url),
            upstox_redirect_uri: env_or("UPSTOX_REDIRECT_URI", &broker_defaults.upstox_redirect_uri),
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", broker_defaults.session_ttl_hours)?,
        };

        Ok(Self {
            database_url,
            bind_addr,
            market_data,
            forecast,
            brokers,
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30u64)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_defaults_cover_fifteen_years() {
        let settings = ForecastSettings::default();
        assert_eq!(settings.horizon_days, 3780);
        assert_eq!(settings.past_days, 3780);
        assert_eq!(settings.seed, 42);
    }

    #[test]
    fn test_env_parse_falls_back_to_default() {
        let value: usize = env_parse("STOCKFOLIO_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }
}
