use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily closing price
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// OHLCV bar for charting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub date: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// Fundamentals and analyst data for a listed company.
///
/// Every field is optional because providers leave gaps for small caps,
/// funds and delisted symbols.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub symbol: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub long_business_summary: Option<String>,
    pub financial_currency: Option<String>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub average_volume: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales_trailing_12_months: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub book_value: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub enterprise_to_revenue: Option<f64>,
    pub enterprise_to_ebitda: Option<f64>,
    pub profit_margins: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub ebitda_margins: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub total_revenue: Option<f64>,
    pub revenue_per_share: Option<f64>,
    pub gross_profits: Option<f64>,
    pub free_cashflow: Option<f64>,
    pub ebitda: Option<f64>,
    pub total_cash: Option<f64>,
    pub total_cash_per_share: Option<f64>,
    pub total_debt: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub float_shares: Option<f64>,
    pub held_percent_insiders: Option<f64>,
    pub held_percent_institutions: Option<f64>,
    pub short_ratio: Option<f64>,
    pub short_percent_of_float: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub earnings_quarterly_growth: Option<f64>,
    pub recommendation_mean: Option<f64>,
    pub recommendation_key: Option<String>,
    pub target_mean_price: Option<f64>,
    pub target_high_price: Option<f64>,
    pub target_low_price: Option<f64>,
    pub number_of_analyst_opinions: Option<f64>,
}

impl CompanyProfile {
    /// Live price, falling back to the regular-market quote
    pub fn price(&self) -> Option<f64> {
        self.current_price.or(self.regular_market_price)
    }
}

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("No '{column}' price data available for {ticker}")]
    MissingColumn { ticker: String, column: String },
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Bars for `ticker` over a provider range such as `1y` or `max`
    async fn fetch_candles(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<Candle>, MarketDataError>;

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError>;

    /// Full daily close history, oldest first.
    ///
    /// Rows without a close are skipped; a series with bars but no closes
    /// at all reports the missing column.
    async fn fetch_daily_closes(&self, ticker: &str) -> Result<Vec<DailyClose>, MarketDataError> {
        let candles = self.fetch_candles(ticker, "max", "1d").await?;
        closes_from_candles(ticker, &candles)
    }
}

pub fn closes_from_candles(ticker: &str, candles: &[Candle]) -> Result<Vec<DailyClose>, MarketDataError> {
    if candles.is_empty() {
        return Err(MarketDataError::NotFound(format!("No price history for {}", ticker)));
    }

    let mut closes: Vec<DailyClose> = candles
        .iter()
        .filter_map(|c| {
            c.close.map(|close| DailyClose {
                date: c.date.date_naive(),
                close,
            })
        })
        .collect();

    if closes.is_empty() {
        return Err(MarketDataError::MissingColumn {
            ticker: ticker.to_string(),
            column: "Close".to_string(),
        });
    }

    closes.sort_by_key(|p| p.date);
    Ok(closes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(day: u32, close: Option<f64>) -> Candle {
        Candle {
            date: Utc.with_ymd_and_hms(2024, 3, day, 14, 30, 0).unwrap(),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    #[test]
    fn test_closes_skip_gaps_and_sort() {
        let candles = vec![candle(5, Some(11.0)), candle(4, None), candle(1, Some(10.0))];
        let closes = closes_from_candles("AAPL", &candles).unwrap();
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].close, 10.0);
        assert_eq!(closes[1].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_bars_without_closes_report_missing_column() {
        let candles = vec![candle(1, None), candle(2, None)];
        let err = closes_from_candles("XYZ", &candles).unwrap_err();
        assert_eq!(err.to_string(), "No 'Close' price data available for XYZ");
    }

    #[test]
    fn test_profile_price_falls_back_to_regular_market() {
        let profile = CompanyProfile {
            regular_market_price: Some(42.0),
            ..Default::default()
        };
        assert_eq!(profile.price(), Some(42.0));
    }
}
