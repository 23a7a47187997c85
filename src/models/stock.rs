use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::external::market_data::{Candle, CompanyProfile};

/// Flattened view of one company used by the comparison screen.
///
/// Ratios that the provider reports as fractions (yield, margins, growth)
/// are expressed in percent here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StockSnapshot {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: f64,
    pub market_cap_fmt: String,
    pub current_price: f64,
    pub daily_change: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub pe_ratio: f64,
    pub pb_ratio: f64,
    pub ps_ratio: f64,
    pub dividend_yield: f64,
    pub peg_ratio: f64,
    pub current_ratio: f64,
    pub debt_to_equity: f64,
    pub profit_margin: f64,
    pub return_on_equity: f64,
    pub revenue_growth: f64,
    pub earnings_growth: f64,
    pub earnings_quarterly_growth: f64,
    pub analyst_rating: String,
    pub target_price: f64,
    pub target_upside: f64,
    pub analyst_count: f64,
    pub beta: f64,
    pub trailing_eps: f64,
    pub forward_eps: f64,
    pub shares_outstanding: f64,
    pub short_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub ticker1: Option<String>,
    #[serde(default)]
    pub ticker2: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValueComparison {
    pub pe_winner: String,
    pub pb_winner: String,
    pub ps_winner: String,
    pub peg_winner: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GrowthComparison {
    pub revenue_growth_winner: String,
    pub earnings_growth_winner: String,
    pub roe_winner: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinancialHealthComparison {
    pub current_ratio_winner: String,
    pub debt_to_equity_winner: String,
    pub profit_margin_winner: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DividendComparison {
    pub dividend_winner: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketSentiment {
    pub analyst_rating_winner: String,
    pub target_upside_winner: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonAnalysis {
    pub value_comparison: ValueComparison,
    pub growth_comparison: GrowthComparison,
    pub financial_health_comparison: FinancialHealthComparison,
    pub dividend_comparison: DividendComparison,
    pub market_sentiment: MarketSentiment,
    pub overall_winner: String,
    pub score: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub ticker1: String,
    pub ticker2: String,
    pub stock1: StockSnapshot,
    pub stock2: StockSnapshot,
    pub analysis: ComparisonAnalysis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockDetailQuery {
    pub interval: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockDetail {
    pub info: CompanyProfile,
    pub history: Vec<Candle>,
}
