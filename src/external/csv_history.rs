use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::Read;
use std::path::PathBuf;

use crate::external::market_data::{Candle, CompanyProfile, MarketDataError, MarketDataProvider};

/// Offline provider reading yfinance-style exports from `<dir>/<TICKER>.csv`.
///
/// Only daily bars are available and every range returns the whole file.
pub struct CsvHistoryProvider {
    dir: PathBuf,
}

impl CsvHistoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, ticker: &str) -> Result<PathBuf, MarketDataError> {
        // Tickers become file names, so keep them inside the data directory
        if ticker.is_empty() || ticker.contains(['/', '\\']) || ticker.contains("..") {
            return Err(MarketDataError::NotFound(format!("Invalid ticker {}", ticker)));
        }
        Ok(self.dir.join(format!("{}.csv", ticker)))
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn number(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    let raw = record.get(idx?)?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a yfinance CSV export into daily candles
pub fn parse_candles<R: Read>(ticker: &str, reader: R) -> Result<Vec<Candle>, MarketDataError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| MarketDataError::Parse(e.to_string()))?
        .clone();

    let date_idx = column(&headers, "Date")
        .or_else(|| column(&headers, "Datetime"))
        .ok_or_else(|| MarketDataError::MissingColumn {
            ticker: ticker.to_string(),
            column: "Date".to_string(),
        })?;

    let close_idx = column(&headers, "Close").ok_or_else(|| MarketDataError::MissingColumn {
        ticker: ticker.to_string(),
        column: "Close".to_string(),
    })?;

    let open_idx = column(&headers, "Open");
    let high_idx = column(&headers, "High");
    let low_idx = column(&headers, "Low");
    let volume_idx = column(&headers, "Volume");

    let mut candles = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| MarketDataError::Parse(e.to_string()))?;

        // "2024-01-02" or "2024-01-02 00:00:00-05:00"
        let raw_date = record.get(date_idx).unwrap_or_default().trim();
        let day = raw_date.get(..10).unwrap_or(raw_date);
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| MarketDataError::Parse(format!("bad date '{}': {}", raw_date, e)))?;
        let Some(midnight) = date.and_hms_opt(0, 0, 0) else { continue };

        candles.push(Candle {
            date: midnight.and_utc(),
            open: number(&record, open_idx),
            high: number(&record, high_idx),
            low: number(&record, low_idx),
            close: number(&record, Some(close_idx)),
            volume: number(&record, volume_idx),
        });
    }

    candles.sort_by_key(|c| c.date);
    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for CsvHistoryProvider {
    async fn fetch_candles(
        &self,
        ticker: &str,
        _range: &str,
        interval: &str,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if interval != "1d" {
            return Err(MarketDataError::BadResponse(format!(
                "CSV data only has daily bars, requested {}",
                interval
            )));
        }

        let path = self.path_for(ticker)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MarketDataError::NotFound(format!("No price history for {}", ticker))
            } else {
                MarketDataError::Network(format!("{}: {}", path.display(), e))
            }
        })?;

        parse_candles(ticker, bytes.as_slice())
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        Err(MarketDataError::NotFound(format!(
            "No company profile for {} in offline data",
            ticker
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_yfinance_export() {
        let data = "Date,Open,High,Low,Close,Volume,Dividends,Stock Splits\n\
                    2024-01-03 00:00:00-05:00,184.2,185.8,182.7,184.2,58414500,0.0,0.0\n\
                    2024-01-02 00:00:00-05:00,187.1,188.4,183.8,185.6,82488700,0.0,0.0\n";

        let candles = parse_candles("AAPL", data.as_bytes()).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, Some(185.6));
        assert_eq!(candles[0].date.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_missing_close_column_is_reported() {
        let data = "Date,Open\n2024-01-02,1.0\n";
        let err = parse_candles("BAD", data.as_bytes()).unwrap_err();
        assert!(matches!(err, MarketDataError::MissingColumn { ref column, .. } if column == "Close"));
    }

    #[test]
    fn test_rejects_path_like_tickers() {
        let provider = CsvHistoryProvider::new("data");
        assert!(provider.path_for("../etc/passwd").is_err());
        assert!(provider.path_for("RELIANCE.NS").is_ok());
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_found() {
        let provider = CsvHistoryProvider::new("/nonexistent-stockfolio-dir");
        let err = provider.fetch_daily_closes("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotFound(_)));
    }
}
