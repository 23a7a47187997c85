use futures::stream::{self, StreamExt};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::market_data::{CompanyProfile, MarketDataError, MarketDataProvider};
use crate::models::{
    AngelHolding, ComparisonAnalysis, ComparisonResult, DividendComparison,
    FinancialHealthComparison, GrowthComparison, HoldingMetrics, MarketSentiment, StockDetail,
    StockSnapshot, ValueComparison,
};

pub const ALLOWED_INTERVALS: [&str; 6] = ["1d", "1h", "5m", "15m", "30m", "90m"];
pub const ALLOWED_PERIODS: [&str; 11] = ["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

/// Listings quoted on US exchanges that keep their broker symbol unchanged
const US_LISTINGS: [&str; 4] = ["MSFT", "AAPL", "GOOGL", "AMZN"];

const PROFILE_CONCURRENCY: usize = 4;

/// Rejects anything that cannot be a market symbol before it reaches a URL
pub fn validate_ticker(ticker: &str) -> Result<(), AppError> {
    let valid = Regex::new(r"^[A-Za-z0-9.\-^=&]{1,20}$")
        .map(|re| re.is_match(ticker))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid ticker symbol: {}", ticker)))
    }
}

/// Maps an Angel One trading symbol (`RELIANCE-EQ`) to its market-data
/// symbol (`RELIANCE.NS`).
pub fn to_market_symbol(trading_symbol: &str) -> String {
    let base = trading_symbol.replace("-EQ", "");
    if US_LISTINGS.contains(&base.as_str()) {
        base
    } else {
        format!("{}.NS", base)
    }
}

/// Enriches a broker holding with fundamentals. Without a profile the row
/// carries broker data only and prices at the broker's LTP.
pub fn holding_metrics(holding: &AngelHolding, profile: Option<&CompanyProfile>) -> HoldingMetrics {
    let ticker = to_market_symbol(&holding.tradingsymbol);
    let empty = CompanyProfile::default();
    let p = profile.unwrap_or(&empty);

    let quantity = holding.quantity;
    let average_price = holding.averageprice;
    let current_price = p.current_price.unwrap_or(holding.ltp);

    let invested_value = average_price * quantity as f64;
    let current_value = current_price * quantity as f64;
    let pnl = current_value - invested_value;
    let pnl_percentage = if invested_value > 0.0 { pnl / invested_value * 100.0 } else { 0.0 };
    let potential_upside = if current_price > 0.0 {
        (p.target_mean_price.unwrap_or(current_price) / current_price - 1.0) * 100.0
    } else {
        0.0
    };

    HoldingMetrics {
        ticker,
        company_name: p.long_name.clone(),
        sector: p.sector.clone(),
        industry: p.industry.clone(),
        market_cap: p.market_cap,
        pe_ratio: p.trailing_pe,
        pb_ratio: p.price_to_book,
        dividend_yield: p.dividend_yield,
        return_on_equity: p.return_on_equity,
        debt_to_equity: p.debt_to_equity,
        current_price,
        fifty_two_week_high: p.fifty_two_week_high,
        fifty_two_week_low: p.fifty_two_week_low,
        beta: p.beta,
        trailing_eps: p.trailing_eps,
        book_value: p.book_value,
        operating_margin: p.operating_margins,
        profit_margin: p.profit_margins,
        revenue: p.total_revenue,
        gross_profit: p.gross_profits,
        free_cash_flow: p.free_cashflow,
        return_on_assets: p.return_on_assets,
        ebitda: p.ebitda,
        quick_ratio: p.quick_ratio,
        current_ratio: p.current_ratio,
        total_debt: p.total_debt,
        total_cash: p.total_cash,
        shares_outstanding: p.shares_outstanding,
        recommendation_mean: p.recommendation_mean,
        recommendation_key: p.recommendation_key.clone(),
        target_mean_price: p.target_mean_price,
        analyst_count: p.number_of_analyst_opinions,
        earnings_growth: p.earnings_growth,
        revenue_growth: p.revenue_growth,
        financial_currency: p.financial_currency.clone(),
        quantity,
        average_price,
        invested_value,
        current_value,
        pnl,
        pnl_percentage,
        potential_upside,
    }
}

async fn holding_with_profile(provider: &dyn MarketDataProvider, holding: &AngelHolding) -> HoldingMetrics {
    let symbol = to_market_symbol(&holding.tradingsymbol);
    match provider.fetch_profile(&symbol).await {
        Ok(profile) => holding_metrics(holding, Some(&profile)),
        Err(e) => {
            warn!("Profile unavailable for {}, using broker prices: {}", symbol, e);
            holding_metrics(holding, None)
        }
    }
}

/// Metrics for every holding, in broker order
pub async fn portfolio_metrics(provider: &dyn MarketDataProvider, holdings: &[AngelHolding]) -> Vec<HoldingMetrics> {
    info!("Building metrics for {} holdings", holdings.len());

    let lookups: Vec<_> = holdings
        .iter()
        .map(|holding| holding_with_profile(provider, holding))
        .collect();

    stream::iter(lookups)
        .buffered(PROFILE_CONCURRENCY)
        .collect()
        .await
}

/// Formats a market capitalisation as `$2.50T`, `$1.20B`, `$3.40M` or a
/// plain dollar amount with thousands separators.
pub fn format_market_cap(market_cap: f64) -> String {
    if market_cap >= 1e12 {
        format!("${:.2}T", market_cap / 1e12)
    } else if market_cap >= 1e9 {
        format!("${:.2}B", market_cap / 1e9)
    } else if market_cap >= 1e6 {
        format!("${:.2}M", market_cap / 1e6)
    } else {
        let whole = format!("{:.0}", market_cap.abs());
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if market_cap < 0.0 && whole != "0" { "-" } else { "" };
        format!("${}{}", sign, grouped)
    }
}

fn percent(fraction: Option<f64>) -> f64 {
    fraction.map(|f| f * 100.0).unwrap_or(0.0)
}

/// Comparison view of a profile. Fractions become percentages and gaps
/// become zero.
pub fn snapshot_from_profile(ticker: &str, profile: &CompanyProfile) -> StockSnapshot {
    let current_price = profile.price().unwrap_or(0.0);
    let previous_close = profile.previous_close.unwrap_or(0.0);
    let daily_change = if previous_close != 0.0 {
        (current_price - previous_close) / previous_close * 100.0
    } else {
        0.0
    };
    let target_price = profile.target_mean_price.unwrap_or(0.0);
    let target_upside = if current_price != 0.0 {
        (target_price / current_price - 1.0) * 100.0
    } else {
        0.0
    };
    let market_cap = profile.market_cap.unwrap_or(0.0);

    StockSnapshot {
        ticker: ticker.to_string(),
        error: None,
        company_name: profile.short_name.clone().unwrap_or_else(|| ticker.to_string()),
        sector: profile.sector.clone().unwrap_or_else(|| "N/A".to_string()),
        industry: profile.industry.clone().unwrap_or_else(|| "N/A".to_string()),
        market_cap,
        market_cap_fmt: format_market_cap(market_cap),
        current_price,
        daily_change,
        fifty_two_week_high: profile.fifty_two_week_high.unwrap_or(0.0),
        fifty_two_week_low: profile.fifty_two_week_low.unwrap_or(0.0),
        pe_ratio: profile.trailing_pe.or(profile.forward_pe).unwrap_or(0.0),
        pb_ratio: profile.price_to_book.unwrap_or(0.0),
        ps_ratio: profile.price_to_sales_trailing_12_months.unwrap_or(0.0),
        dividend_yield: percent(profile.dividend_yield),
        peg_ratio: profile.peg_ratio.unwrap_or(0.0),
        current_ratio: profile.current_ratio.unwrap_or(0.0),
        debt_to_equity: profile.debt_to_equity.unwrap_or(0.0),
        profit_margin: percent(profile.profit_margins),
        return_on_equity: percent(profile.return_on_equity),
        revenue_growth: percent(profile.revenue_growth),
        earnings_growth: percent(profile.earnings_growth),
        earnings_quarterly_growth: percent(profile.earnings_quarterly_growth),
        analyst_rating: profile.recommendation_key.clone().unwrap_or_else(|| "N/A".to_string()),
        target_price,
        target_upside,
        analyst_count: profile.number_of_analyst_opinions.unwrap_or(0.0),
        beta: profile.beta.unwrap_or(0.0),
        trailing_eps: profile.trailing_eps.unwrap_or(0.0),
        forward_eps: profile.forward_eps.unwrap_or(0.0),
        shares_outstanding: profile.shares_outstanding.unwrap_or(0.0),
        short_ratio: profile.short_ratio.unwrap_or(0.0),
    }
}

/// Placeholder snapshot for a ticker whose data could not be fetched
pub fn error_snapshot(ticker: &str, error: &MarketDataError) -> StockSnapshot {
    StockSnapshot {
        ticker: ticker.to_string(),
        error: Some(error.to_string()),
        company_name: ticker.to_string(),
        sector: "N/A".to_string(),
        industry: "N/A".to_string(),
        ..Default::default()
    }
}

pub async fn fetch_snapshot(provider: &dyn MarketDataProvider, ticker: &str) -> StockSnapshot {
    match provider.fetch_profile(ticker).await {
        Ok(profile) => snapshot_from_profile(ticker, &profile),
        Err(e) => {
            warn!("Error fetching data for {}: {}", ticker, e);
            error_snapshot(ticker, &e)
        }
    }
}

pub fn rating_rank(rating: &str) -> u8 {
    match rating {
        "strongBuy" => 5,
        "buy" => 4,
        "hold" => 3,
        "underperform" => 2,
        "sell" => 1,
        _ => 0,
    }
}

/// Picks `first` only when it strictly wins; every tie goes to `second`
fn pick(first_wins: bool, first: &str, second: &str) -> String {
    if first_wins { first.to_string() } else { second.to_string() }
}

fn lower_positive(a: f64, b: f64) -> bool {
    a < b && a > 0.0
}

pub fn generate_analysis(ticker1: &str, ticker2: &str, s1: &StockSnapshot, s2: &StockSnapshot) -> ComparisonAnalysis {
    let value_comparison = ValueComparison {
        pe_winner: pick(lower_positive(s1.pe_ratio, s2.pe_ratio), ticker1, ticker2),
        pb_winner: pick(lower_positive(s1.pb_ratio, s2.pb_ratio), ticker1, ticker2),
        ps_winner: pick(lower_positive(s1.ps_ratio, s2.ps_ratio), ticker1, ticker2),
        peg_winner: pick(lower_positive(s1.peg_ratio, s2.peg_ratio), ticker1, ticker2),
    };
    let growth_comparison = GrowthComparison {
        revenue_growth_winner: pick(s1.revenue_growth > s2.revenue_growth, ticker1, ticker2),
        earnings_growth_winner: pick(s1.earnings_growth > s2.earnings_growth, ticker1, ticker2),
        roe_winner: pick(s1.return_on_equity > s2.return_on_equity, ticker1, ticker2),
    };
    let financial_health_comparison = FinancialHealthComparison {
        current_ratio_winner: pick(s1.current_ratio > s2.current_ratio, ticker1, ticker2),
        debt_to_equity_winner: pick(lower_positive(s1.debt_to_equity, s2.debt_to_equity), ticker1, ticker2),
        profit_margin_winner: pick(s1.profit_margin > s2.profit_margin, ticker1, ticker2),
    };
    let dividend_comparison = DividendComparison {
        dividend_winner: pick(s1.dividend_yield > s2.dividend_yield, ticker1, ticker2),
    };
    let market_sentiment = MarketSentiment {
        analyst_rating_winner: pick(
            rating_rank(&s1.analyst_rating) > rating_rank(&s2.analyst_rating),
            ticker1,
            ticker2,
        ),
        target_upside_winner: pick(s1.target_upside > s2.target_upside, ticker1, ticker2),
    };

    let winners = [
        &value_comparison.pe_winner,
        &value_comparison.pb_winner,
        &value_comparison.ps_winner,
        &value_comparison.peg_winner,
        &growth_comparison.revenue_growth_winner,
        &growth_comparison.earnings_growth_winner,
        &growth_comparison.roe_winner,
        &financial_health_comparison.current_ratio_winner,
        &financial_health_comparison.debt_to_equity_winner,
        &financial_health_comparison.profit_margin_winner,
        &dividend_comparison.dividend_winner,
        &market_sentiment.analyst_rating_winner,
        &market_sentiment.target_upside_winner,
    ];

    // Counted first for ticker1 so identical tickers land on one key.
    let score1 = winners.iter().filter(|w| w.as_str() == ticker1).count() as u32;
    let score2 = winners.iter().filter(|w| w.as_str() == ticker2 && ticker2 != ticker1).count() as u32;

    let mut score = BTreeMap::new();
    score.insert(ticker2.to_string(), score2);
    score.insert(ticker1.to_string(), score1);

    ComparisonAnalysis {
        value_comparison,
        growth_comparison,
        financial_health_comparison,
        dividend_comparison,
        market_sentiment,
        overall_winner: pick(score1 > score2, ticker1, ticker2),
        score,
    }
}

/// Side-by-side fundamentals for two tickers plus the category winners
pub async fn compare_stocks(provider: &dyn MarketDataProvider, ticker1: &str, ticker2: &str) -> ComparisonResult {
    info!("Comparing {} with {}", ticker1, ticker2);

    let (stock1, stock2) = futures::join!(
        fetch_snapshot(provider, ticker1),
        fetch_snapshot(provider, ticker2)
    );
    let analysis = generate_analysis(ticker1, ticker2, &stock1, &stock2);

    ComparisonResult {
        ticker1: ticker1.to_string(),
        ticker2: ticker2.to_string(),
        stock1,
        stock2,
        analysis,
    }
}

/// Validates chart parameters and clamps long ranges on intraday bars,
/// which the provider only keeps for about two years.
pub fn resolve_history_window(interval: Option<&str>, period: Option<&str>) -> Result<(String, String), AppError> {
    let interval = interval.unwrap_or("1d");
    let period = period.unwrap_or("max");

    if !ALLOWED_INTERVALS.contains(&interval) {
        return Err(AppError::Validation(format!(
            "Invalid interval. Allowed: {}",
            ALLOWED_INTERVALS.join(", ")
        )));
    }
    if !ALLOWED_PERIODS.contains(&period) {
        return Err(AppError::Validation(format!(
            "Invalid period. Allowed: {}",
            ALLOWED_PERIODS.join(", ")
        )));
    }

    let period = if interval != "1d" && matches!(period, "max" | "10y" | "5y") {
        warn!("{} period requested for non-daily interval ({}). Using 2y.", period, interval);
        "2y"
    } else {
        period
    };

    Ok((interval.to_string(), period.to_string()))
}

/// Chart history plus company profile for the detail page
pub async fn stock_detail(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    interval: Option<&str>,
    period: Option<&str>,
) -> Result<StockDetail, AppError> {
    validate_ticker(ticker)?;
    let (interval, period) = resolve_history_window(interval, period)?;
    info!("Fetching data for {}, interval {}, period {}", ticker, interval, period);

    let no_data = || {
        AppError::NotFound(format!(
            "No historical data found for {} for the selected period/interval.",
            ticker
        ))
    };

    let history = match provider.fetch_candles(ticker, &period, &interval).await {
        Ok(history) => history,
        Err(MarketDataError::NotFound(_)) => return Err(no_data()),
        Err(e) => return Err(e.into()),
    };
    if history.is_empty() {
        return Err(no_data());
    }

    let info = match provider.fetch_profile(ticker).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Profile unavailable for {}: {}", ticker, e);
            CompanyProfile {
                symbol: ticker.to_string(),
                ..Default::default()
            }
        }
    };

    Ok(StockDetail { info, history })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(symbol: &str, quantity: i64, average: f64, ltp: f64) -> AngelHolding {
        AngelHolding {
            tradingsymbol: symbol.to_string(),
            quantity,
            averageprice: average,
            ltp,
            ..Default::default()
        }
    }

    struct ProfileProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for ProfileProvider {
        async fn fetch_candles(
            &self,
            ticker: &str,
            _range: &str,
            _interval: &str,
        ) -> Result<Vec<crate::external::market_data::Candle>, MarketDataError> {
            Err(MarketDataError::NotFound(ticker.to_string()))
        }

        async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile, MarketDataError> {
            if ticker == "INFY.NS" {
                return Ok(CompanyProfile {
                    current_price: Some(120.0),
                    ..Default::default()
                });
            }
            Err(MarketDataError::NotFound(ticker.to_string()))
        }

        async fn fetch_daily_closes(
            &self,
            ticker: &str,
        ) -> Result<Vec<crate::external::market_data::DailyClose>, MarketDataError> {
            Err(MarketDataError::NotFound(ticker.to_string()))
        }
    }

    fn require_send<T: Send>(value: T) -> T {
        value
    }

    #[tokio::test]
    async fn test_portfolio_metrics_keep_broker_order() {
        let holdings: Vec<AngelHolding> = ["TCS-EQ", "INFY-EQ", "SBIN-EQ", "ITC-EQ", "WIPRO-EQ", "HDFC-EQ"]
            .iter()
            .map(|s| holding(s, 10, 100.0, 90.0))
            .collect();

        // handlers hand this future to axum, which needs it to be Send
        let metrics = require_send(portfolio_metrics(&ProfileProvider, &holdings)).await;

        let tickers: Vec<&str> = metrics.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(tickers, ["TCS.NS", "INFY.NS", "SBIN.NS", "ITC.NS", "WIPRO.NS", "HDFC.NS"]);
        assert_eq!(metrics[1].current_price, 120.0);
        assert_eq!(metrics[0].current_price, 90.0);
    }

    #[test]
    fn test_symbol_conversion() {
        assert_eq!(to_market_symbol("RELIANCE-EQ"), "RELIANCE.NS");
        assert_eq!(to_market_symbol("AAPL"), "AAPL");
        assert_eq!(to_market_symbol("GOOGL-EQ"), "GOOGL");
        assert_eq!(to_market_symbol("TCS"), "TCS.NS");
    }

    #[test]
    fn test_holding_metrics_use_profile_price() {
        let profile = CompanyProfile {
            current_price: Some(120.0),
            target_mean_price: Some(150.0),
            long_name: Some("Infosys Limited".into()),
            ..Default::default()
        };
        let m = holding_metrics(&holding("INFY-EQ", 10, 100.0, 118.0), Some(&profile));

        assert_eq!(m.ticker, "INFY.NS");
        assert_eq!(m.invested_value, 1000.0);
        assert_eq!(m.current_value, 1200.0);
        assert_eq!(m.pnl, 200.0);
        assert!((m.pnl_percentage - 20.0).abs() < 1e-9);
        assert!((m.potential_upside - 25.0).abs() < 1e-9);
        assert_eq!(m.company_name.as_deref(), Some("Infosys Limited"));
    }

    #[test]
    fn test_holding_metrics_fall_back_to_ltp() {
        let m = holding_metrics(&holding("SBIN-EQ", 4, 50.0, 45.0), None);
        assert_eq!(m.current_price, 45.0);
        assert_eq!(m.pnl, -20.0);
        assert_eq!(m.potential_upside, 0.0);
        assert!(m.sector.is_none());
    }

    #[test]
    fn test_zero_investment_has_zero_pnl_percentage() {
        let m = holding_metrics(&holding("BONUS-EQ", 0, 0.0, 0.0), None);
        assert_eq!(m.pnl_percentage, 0.0);
        assert_eq!(m.potential_upside, 0.0);
    }

    #[test]
    fn test_market_cap_formatting() {
        assert_eq!(format_market_cap(2.5e12), "$2.50T");
        assert_eq!(format_market_cap(1_234_000_000.0), "$1.23B");
        assert_eq!(format_market_cap(3_400_000.0), "$3.40M");
        assert_eq!(format_market_cap(987_654.0), "$987,654");
        assert_eq!(format_market_cap(1_000.0), "$1,000");
        assert_eq!(format_market_cap(0.0), "$0");
    }

    #[test]
    fn test_rating_ranks() {
        assert_eq!(rating_rank("strongBuy"), 5);
        assert_eq!(rating_rank("buy"), 4);
        assert_eq!(rating_rank("hold"), 3);
        assert_eq!(rating_rank("underperform"), 2);
        assert_eq!(rating_rank("sell"), 1);
        assert_eq!(rating_rank("N/A"), 0);
        assert_eq!(rating_rank("strong_buy"), 0);
    }

    #[test]
    fn test_snapshot_converts_fractions_to_percent() {
        let profile = CompanyProfile {
            current_price: Some(110.0),
            previous_close: Some(100.0),
            dividend_yield: Some(0.015),
            target_mean_price: Some(132.0),
            forward_pe: Some(18.0),
            ..Default::default()
        };
        let s = snapshot_from_profile("ACME", &profile);
        assert!((s.daily_change - 10.0).abs() < 1e-9);
        assert!((s.dividend_yield - 1.5).abs() < 1e-9);
        assert!((s.target_upside - 20.0).abs() < 1e-9);
        assert_eq!(s.pe_ratio, 18.0);
        assert_eq!(s.company_name, "ACME");
        assert_eq!(s.analyst_rating, "N/A");
    }

    #[test]
    fn test_analysis_ties_go_to_second_ticker() {
        let a = StockSnapshot::default();
        let b = StockSnapshot::default();
        let analysis = generate_analysis("AAA", "BBB", &a, &b);
        assert_eq!(analysis.overall_winner, "BBB");
        assert_eq!(analysis.score["AAA"], 0);
        assert_eq!(analysis.score["BBB"], 13);
    }

    #[test]
    fn test_analysis_rewards_cheaper_and_faster_growth() {
        let cheap = StockSnapshot {
            pe_ratio: 12.0,
            pb_ratio: 1.5,
            ps_ratio: 2.0,
            peg_ratio: 0.9,
            revenue_growth: 15.0,
            earnings_growth: 20.0,
            return_on_equity: 18.0,
            current_ratio: 2.0,
            debt_to_equity: 30.0,
            profit_margin: 22.0,
            dividend_yield: 1.2,
            analyst_rating: "buy".into(),
            target_upside: 12.0,
            ..Default::default()
        };
        let pricey = StockSnapshot {
            pe_ratio: 40.0,
            pb_ratio: 9.0,
            ps_ratio: 10.0,
            peg_ratio: 2.5,
            revenue_growth: 5.0,
            earnings_growth: 3.0,
            return_on_equity: 8.0,
            current_ratio: 1.0,
            debt_to_equity: 120.0,
            profit_margin: 6.0,
            dividend_yield: 0.0,
            analyst_rating: "hold".into(),
            target_upside: 2.0,
            ..Default::default()
        };
        let analysis = generate_analysis("CHEAP", "PRICEY", &cheap, &pricey);
        assert_eq!(analysis.overall_winner, "CHEAP");
        assert_eq!(analysis.score["CHEAP"], 13);
        assert_eq!(analysis.value_comparison.pe_winner, "CHEAP");
        assert_eq!(analysis.market_sentiment.analyst_rating_winner, "CHEAP");
    }

    #[test]
    fn test_non_positive_ratio_never_wins_value() {
        let a = StockSnapshot { pe_ratio: -5.0, ..Default::default() };
        let b = StockSnapshot { pe_ratio: 20.0, ..Default::default() };
        let analysis = generate_analysis("LOSS", "PROFIT", &a, &b);
        assert_eq!(analysis.value_comparison.pe_winner, "PROFIT");
    }

    #[test]
    fn test_history_window_validation_and_clamp() {
        assert_eq!(
            resolve_history_window(None, None).unwrap(),
            ("1d".to_string(), "max".to_string())
        );
        assert_eq!(
            resolve_history_window(Some("1h"), Some("max")).unwrap().1,
            "2y"
        );
        assert_eq!(
            resolve_history_window(Some("15m"), Some("5y")).unwrap().1,
            "2y"
        );
        assert_eq!(
            resolve_history_window(Some("1h"), Some("1y")).unwrap().1,
            "1y"
        );
        assert!(matches!(
            resolve_history_window(Some("2m"), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            resolve_history_window(None, Some("3y")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_ticker_validation() {
        assert!(validate_ticker("RELIANCE.NS").is_ok());
        assert!(validate_ticker("^GSPC").is_ok());
        assert!(validate_ticker("BRK-B").is_ok());
        assert!(validate_ticker("../etc").is_err());
        assert!(validate_ticker("").is_err());
    }
}
