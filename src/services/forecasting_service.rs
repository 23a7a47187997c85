use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Duration;
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ForecastSettings;
use crate::external::market_data::{DailyClose, MarketDataError, MarketDataProvider};
use crate::models::{BatchForecast, ForecastEntry, SeriesPoint};
use crate::services::scaler::MinMaxScaler;
use crate::services::sequence_model::{BiLstmModel, ModelError, SequenceModel};

/// Expected daily log-return drift of the GBM adjustment
pub const DAILY_DRIFT: f64 = 0.0002;
/// Daily volatility of the GBM adjustment
pub const DAILY_VOLATILITY: f64 = 0.02;
/// Share of each step taken from the model; the rest comes from GBM
pub const MODEL_BLEND_WEIGHT: f64 = 0.7;
/// Projected prices never fall below this
pub const PRICE_FLOOR: f64 = 0.01;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("No price history available for {0}")]
    EmptyHistory(String),

    #[error("forecast model failed: {0}")]
    Model(#[from] ModelError),

    #[error("forecast worker failed: {0}")]
    Worker(String),
}

/// Day-over-day differences of `closes`, zero-padded at the front and cut
/// to the last `lookback` values.
pub fn difference_window(closes: &[f64], lookback: usize) -> Vec<f64> {
    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.len() >= lookback {
        return diffs[diffs.len() - lookback..].to_vec();
    }

    let mut window = vec![0.0; lookback - diffs.len()];
    window.extend(diffs);
    window
}

/// One GBM step multiplier for `dt = 1`
fn gbm_factor(z: f64) -> f64 {
    ((DAILY_DRIFT - 0.5 * DAILY_VOLATILITY * DAILY_VOLATILITY) + DAILY_VOLATILITY * z).exp()
}

/// Projects closing-price series forward by blending a pretrained sequence
/// model with a geometric-Brownian-motion adjustment.
///
/// The model and scaler are loaded once and shared across requests. Each
/// batch call seeds its own generator so identical inputs reproduce
/// identical paths.
pub struct Forecaster {
    model: Arc<dyn SequenceModel>,
    scaler: MinMaxScaler,
    horizon_days: usize,
    past_days: usize,
    seed: u64,
    fetch_concurrency: usize,
}

impl Forecaster {
    pub fn new(model: Arc<dyn SequenceModel>, scaler: MinMaxScaler, settings: &ForecastSettings) -> Self {
        Self {
            model,
            scaler,
            horizon_days: settings.horizon_days,
            past_days: settings.past_days,
            seed: settings.seed,
            fetch_concurrency: settings.fetch_concurrency.max(1),
        }
    }

    /// Reads the model and scaler artifacts named in `settings`
    pub fn load(settings: &ForecastSettings) -> Result<Self, ModelError> {
        let model = BiLstmModel::load(&settings.model_path)?;
        let scaler = MinMaxScaler::load(&settings.scaler_path)?;
        info!(
            "Loaded forecast model from {} (lookback {})",
            settings.model_path.display(),
            model.lookback()
        );
        Ok(Self::new(Arc::new(model), scaler, settings))
    }

    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    /// Scaled input window for the model built from raw closes
    pub fn prepare_window(&self, closes: &[f64]) -> VecDeque<f64> {
        difference_window(closes, self.model.lookback())
            .into_iter()
            .map(|d| self.scaler.transform(d))
            .collect()
    }

    /// Walks `horizon_days` steps forward from `last_price`.
    ///
    /// The window is fed back with the model's own scaled predictions, not
    /// with the blended moves.
    pub fn project_prices<R: Rng + ?Sized>(
        &self,
        last_price: f64,
        mut window: VecDeque<f64>,
        rng: &mut R,
    ) -> Result<Vec<f64>, ModelError> {
        let mut price = last_price;
        let mut path = Vec::with_capacity(self.horizon_days);

        for _ in 0..self.horizon_days {
            let scaled = self.model.predict(window.make_contiguous())?;
            let predicted_diff = self.scaler.inverse_transform(scaled);

            let z: f64 = rng.sample(StandardNormal);
            let adjustment = price * (gbm_factor(z) - 1.0);

            let blended = MODEL_BLEND_WEIGHT * predicted_diff + (1.0 - MODEL_BLEND_WEIGHT) * adjustment;
            price = (price + blended).max(PRICE_FLOOR);
            path.push(price);

            window.pop_front();
            window.push_back(scaled);
        }

        Ok(path)
    }

    /// Recent history followed by the projected path for one symbol
    pub fn forecast_series<R: Rng + ?Sized>(
        &self,
        ticker: &str,
        history: &[DailyClose],
        rng: &mut R,
    ) -> Result<Vec<SeriesPoint>, ForecastError> {
        let last = history
            .last()
            .ok_or_else(|| ForecastError::EmptyHistory(ticker.to_string()))?;

        let closes: Vec<f64> = history.iter().map(|p| p.close).collect();
        let window = self.prepare_window(&closes);
        let projected = self.project_prices(last.close, window, rng)?;

        let keep = history.len().min(self.past_days);
        let mut series = Vec::with_capacity(keep + projected.len());
        series.extend(history[history.len() - keep..].iter().map(|p| SeriesPoint {
            date: p.date.format(DATE_FORMAT).to_string(),
            value: p.close,
        }));

        let mut date = last.date;
        for value in projected {
            date = date + Duration::days(1);
            series.push(SeriesPoint {
                date: date.format(DATE_FORMAT).to_string(),
                value,
            });
        }

        Ok(series)
    }

    /// Forecasts every ticker, isolating failures per symbol.
    ///
    /// Histories are fetched concurrently in input order. Projection is CPU
    /// bound and runs on the blocking pool, sequentially, so all symbols
    /// draw from one seeded stream in a fixed order.
    pub async fn forecast_batch(
        self: &Arc<Self>,
        provider: &dyn MarketDataProvider,
        tickers: &[String],
    ) -> Result<BatchForecast, ForecastError> {
        info!("Forecasting {} tickers ({} days ahead)", tickers.len(), self.horizon_days);

        let fetches: Vec<_> = tickers
            .iter()
            .map(|ticker| provider.fetch_daily_closes(ticker))
            .collect();
        let histories: Vec<Result<Vec<DailyClose>, MarketDataError>> = stream::iter(fetches)
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let forecaster = Arc::clone(self);
        let tickers = tickers.to_vec();
        tokio::task::spawn_blocking(move || forecaster.project_batch(&tickers, histories))
            .await
            .map_err(|e| ForecastError::Worker(e.to_string()))
    }

    /// Projects already-fetched histories in input order from one seeded
    /// generator
    pub fn project_batch(
        &self,
        tickers: &[String],
        histories: Vec<Result<Vec<DailyClose>, MarketDataError>>,
    ) -> BatchForecast {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut results = BatchForecast::new();

        for (ticker, history) in tickers.iter().zip(histories) {
            let entry = history
                .map_err(ForecastError::from)
                .and_then(|h| self.forecast_series(ticker, &h, &mut rng));

            match entry {
                Ok(series) => {
                    results.insert(ticker.clone(), ForecastEntry::Series(series));
                }
                Err(e) => {
                    warn!("Forecast failed for {}: {}", ticker, e);
                    results.insert(ticker.clone(), ForecastEntry::Failed { error: e.to_string() });
                }
            }
        }

        results
    }
}
