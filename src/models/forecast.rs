use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single point of a price series, historical or projected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: String, // YYYY-MM-DD
    pub value: f64,
}

/// Per-symbol outcome of a batch forecast.
///
/// Serializes either as the bare series array or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForecastEntry {
    Series(Vec<SeriesPoint>),
    Failed { error: String },
}

impl ForecastEntry {
    pub fn is_error(&self) -> bool {
        matches!(self, ForecastEntry::Failed { .. })
    }
}

pub type BatchForecast = BTreeMap<String, ForecastEntry>;

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesRequest {
    #[serde(default)]
    pub tickers: Vec<String>,
}
