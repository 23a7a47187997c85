use serde::{Deserialize, Serialize};

/// Holding row as returned by the Angel One portfolio endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AngelHolding {
    pub tradingsymbol: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub isin: Option<String>,
    #[serde(default)]
    pub symboltoken: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub averageprice: f64,
    #[serde(default)]
    pub ltp: f64,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub profitandloss: Option<f64>,
    #[serde(default)]
    pub pnlpercentage: Option<f64>,
}

/// A holding enriched with market data, keyed the way the dashboard table
/// reads it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HoldingMetrics {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Company Name")]
    pub company_name: Option<String>,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "Market Cap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "P/E Ratio")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "P/B Ratio")]
    pub pb_ratio: Option<f64>,
    #[serde(rename = "Dividend Yield")]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "Return on Equity (ROE)")]
    pub return_on_equity: Option<f64>,
    #[serde(rename = "Debt to Equity Ratio")]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "Current Price")]
    pub current_price: f64,
    #[serde(rename = "52-Week High")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(rename = "52-Week Low")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(rename = "Beta")]
    pub beta: Option<f64>,
    #[serde(rename = "EPS (TTM)")]
    pub trailing_eps: Option<f64>,
    #[serde(rename = "Book Value")]
    pub book_value: Option<f64>,
    #[serde(rename = "Operating Margin")]
    pub operating_margin: Option<f64>,
    #[serde(rename = "Profit Margin")]
    pub profit_margin: Option<f64>,
    #[serde(rename = "Revenue")]
    pub revenue: Option<f64>,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: Option<f64>,
    #[serde(rename = "Free Cash Flow")]
    pub free_cash_flow: Option<f64>,
    #[serde(rename = "Return on Assets (ROA)")]
    pub return_on_assets: Option<f64>,
    #[serde(rename = "EBITDA")]
    pub ebitda: Option<f64>,
    #[serde(rename = "Quick Ratio")]
    pub quick_ratio: Option<f64>,
    #[serde(rename = "Current Ratio")]
    pub current_ratio: Option<f64>,
    #[serde(rename = "Total Debt")]
    pub total_debt: Option<f64>,
    #[serde(rename = "Total Cash")]
    pub total_cash: Option<f64>,
    #[serde(rename = "Shares Outstanding")]
    pub shares_outstanding: Option<f64>,
    #[serde(rename = "Analyst Recommendation Mean")]
    pub recommendation_mean: Option<f64>,
    #[serde(rename = "Analyst Recommendation Key")]
    pub recommendation_key: Option<String>,
    #[serde(rename = "Target Mean Price")]
    pub target_mean_price: Option<f64>,
    #[serde(rename = "Number of Analysts")]
    pub analyst_count: Option<f64>,
    #[serde(rename = "Earnings Growth")]
    pub earnings_growth: Option<f64>,
    #[serde(rename = "Revenue Growth")]
    pub revenue_growth: Option<f64>,
    #[serde(rename = "Financial Currency")]
    pub financial_currency: Option<String>,
    #[serde(rename = "Holding Quantity")]
    pub quantity: i64,
    #[serde(rename = "Average Price")]
    pub average_price: f64,
    #[serde(rename = "Invested Value")]
    pub invested_value: f64,
    #[serde(rename = "Current Value")]
    pub current_value: f64,
    #[serde(rename = "PnL")]
    pub pnl: f64,
    #[serde(rename = "PnL Percentage")]
    pub pnl_percentage: f64,
    #[serde(rename = "Potential Upside")]
    pub potential_upside: f64,
}
