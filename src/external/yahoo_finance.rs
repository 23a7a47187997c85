use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::external::market_data::{Candle, CompanyProfile, MarketDataError, MarketDataProvider};

const QUOTE_SUMMARY_MODULES: &str =
    "price,summaryDetail,financialData,defaultKeyStatistics,assetProfile";

/// Yahoo Finance provider. No API key required.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; Stockfolio/0.1)")
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        match resp.status().as_u16() {
            429 => return Err(MarketDataError::RateLimited),
            404 => return Err(MarketDataError::NotFound(url.to_string())),
            s if !(200..300).contains(&s) => {
                return Err(MarketDataError::BadResponse(format!("HTTP {}", s)))
            }
            _ => {}
        }

        resp.json::<T>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<Value>>,
    error: Option<YahooError>,
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn candles_from_chart(result: &ChartResult) -> Vec<Candle> {
    let quote = result.indicators.quote.first();
    let empty = Quote::default();
    let quote = quote.unwrap_or(&empty);

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = chrono::DateTime::from_timestamp(*ts, 0)?;
            Some(Candle {
                date,
                open: at(&quote.open, i),
                high: at(&quote.high, i),
                low: at(&quote.low, i),
                close: at(&quote.close, i),
                volume: at(&quote.volume, i),
            })
        })
        .collect()
}

/// Number out of a quoteSummary field, which is either `{"raw": n}` or `n`
fn raw_number(modules: &Value, module: &str, key: &str) -> Option<f64> {
    let field = modules.get(module)?.get(key)?;
    match field {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}

fn text(modules: &Value, module: &str, key: &str) -> Option<String> {
    modules
        .get(module)?
        .get(key)?
        .as_str()
        .map(str::to_string)
}

fn first_number(modules: &Value, lookups: &[(&str, &str)]) -> Option<f64> {
    lookups
        .iter()
        .find_map(|(module, key)| raw_number(modules, module, key))
}

pub(crate) fn profile_from_summary(symbol: &str, m: &Value) -> CompanyProfile {
    CompanyProfile {
        symbol: text(m, "price", "symbol").unwrap_or_else(|| symbol.to_string()),
        short_name: text(m, "price", "shortName"),
        long_name: text(m, "price", "longName"),
        sector: text(m, "assetProfile", "sector"),
        industry: text(m, "assetProfile", "industry"),
        country: text(m, "assetProfile", "country"),
        website: text(m, "assetProfile", "website"),
        long_business_summary: text(m, "assetProfile", "longBusinessSummary"),
        financial_currency: text(m, "financialData", "financialCurrency"),
        market_cap: first_number(m, &[("price", "marketCap"), ("summaryDetail", "marketCap")]),
        current_price: raw_number(m, "financialData", "currentPrice"),
        regular_market_price: raw_number(m, "price", "regularMarketPrice"),
        previous_close: first_number(m, &[("summaryDetail", "previousClose"), ("price", "regularMarketPreviousClose")]),
        fifty_two_week_high: raw_number(m, "summaryDetail", "fiftyTwoWeekHigh"),
        fifty_two_week_low: raw_number(m, "summaryDetail", "fiftyTwoWeekLow"),
        average_volume: raw_number(m, "summaryDetail", "averageVolume"),
        trailing_pe: raw_number(m, "summaryDetail", "trailingPE"),
        forward_pe: first_number(m, &[("summaryDetail", "forwardPE"), ("defaultKeyStatistics", "forwardPE")]),
        price_to_book: raw_number(m, "defaultKeyStatistics", "priceToBook"),
        price_to_sales_trailing_12_months: raw_number(m, "summaryDetail", "priceToSalesTrailing12Months"),
        peg_ratio: raw_number(m, "defaultKeyStatistics", "pegRatio"),
        dividend_yield: raw_number(m, "summaryDetail", "dividendYield"),
        payout_ratio: raw_number(m, "summaryDetail", "payoutRatio"),
        beta: first_number(m, &[("summaryDetail", "beta"), ("defaultKeyStatistics", "beta")]),
        trailing_eps: raw_number(m, "defaultKeyStatistics", "trailingEps"),
        forward_eps: raw_number(m, "defaultKeyStatistics", "forwardEps"),
        book_value: raw_number(m, "defaultKeyStatistics", "bookValue"),
        enterprise_value: raw_number(m, "defaultKeyStatistics", "enterpriseValue"),
        enterprise_to_revenue: raw_number(m, "defaultKeyStatistics", "enterpriseToRevenue"),
        enterprise_to_ebitda: raw_number(m, "defaultKeyStatistics", "enterpriseToEbitda"),
        profit_margins: first_number(m, &[("financialData", "profitMargins"), ("defaultKeyStatistics", "profitMargins")]),
        gross_margins: raw_number(m, "financialData", "grossMargins"),
        operating_margins: raw_number(m, "financialData", "operatingMargins"),
        ebitda_margins: raw_number(m, "financialData", "ebitdaMargins"),
        return_on_equity: raw_number(m, "financialData", "returnOnEquity"),
        return_on_assets: raw_number(m, "financialData", "returnOnAssets"),
        debt_to_equity: raw_number(m, "financialData", "debtToEquity"),
        current_ratio: raw_number(m, "financialData", "currentRatio"),
        quick_ratio: raw_number(m, "financialData", "quickRatio"),
        total_revenue: raw_number(m, "financialData", "totalRevenue"),
        revenue_per_share: raw_number(m, "financialData", "revenuePerShare"),
        gross_profits: raw_number(m, "financialData", "grossProfits"),
        free_cashflow: raw_number(m, "financialData", "freeCashflow"),
        ebitda: raw_number(m, "financialData", "ebitda"),
        total_cash: raw_number(m, "financialData", "totalCash"),
        total_cash_per_share: raw_number(m, "financialData", "totalCashPerShare"),
        total_debt: raw_number(m, "financialData", "totalDebt"),
        shares_outstanding: raw_number(m, "defaultKeyStatistics", "sharesOutstanding"),
        float_shares: raw_number(m, "defaultKeyStatistics", "floatShares"),
        held_percent_insiders: raw_number(m, "defaultKeyStatistics", "heldPercentInsiders"),
        held_percent_institutions: raw_number(m, "defaultKeyStatistics", "heldPercentInstitutions"),
        short_ratio: raw_number(m, "defaultKeyStatistics", "shortRatio"),
        short_percent_of_float: raw_number(m, "defaultKeyStatistics", "shortPercentOfFloat"),
        revenue_growth: raw_number(m, "financialData", "revenueGrowth"),
        earnings_growth: raw_number(m, "financialData", "earningsGrowth"),
        earnings_quarterly_growth: raw_number(m, "defaultKeyStatistics", "earningsQuarterlyGrowth"),
        recommendation_mean: raw_number(m, "financialData", "recommendationMean"),
        recommendation_key: text(m, "financialData", "recommendationKey"),
        target_mean_price: raw_number(m, "financialData", "targetMeanPrice"),
        target_high_price: raw_number(m, "financialData", "targetHighPrice"),
        target_low_price: raw_number(m, "financialData", "targetLowPrice"),
        number_of_analyst_opinions: raw_number(m, "financialData", "numberOfAnalystOpinions"),
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_candles(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let body: ChartResponse = self
            .get_json(&url, &[("interval", interval), ("range", range), ("includeAdjustedClose", "true")])
            .await?;

        if let Some(error) = body.chart.error {
            if error.description.contains("No data found") {
                return Err(MarketDataError::NotFound(format!("No data found for {}", ticker)));
            }
            return Err(MarketDataError::BadResponse(error.description));
        }

        let results = body
            .chart
            .result
            .ok_or_else(|| MarketDataError::BadResponse("No results in response".into()))?;

        let result = results
            .first()
            .ok_or_else(|| MarketDataError::NotFound(format!("No data found for {}", ticker)))?;

        let mut candles = candles_from_chart(result);
        candles.sort_by_key(|c| c.date);
        Ok(candles)
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        let body: QuoteSummaryResponse = self
            .get_json(&url, &[("modules", QUOTE_SUMMARY_MODULES)])
            .await?;

        if let Some(error) = body.quote_summary.error {
            return Err(MarketDataError::BadResponse(error.description));
        }

        let modules = body
            .quote_summary
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .ok_or_else(|| MarketDataError::NotFound(format!("No profile for {}", ticker)))?;

        Ok(profile_from_summary(ticker, &modules))
    }
}
