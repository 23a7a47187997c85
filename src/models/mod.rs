mod forecast;
mod holding;
mod session;
mod stock;
mod user;
mod watchlist;
mod finance_question;
mod order;
mod llm;

pub use forecast::{BatchForecast, ForecastEntry, SeriesPoint, TimeSeriesRequest};
pub use holding::{AngelHolding, HoldingMetrics};
pub use session::{Broker, BrokerSession, SessionCreated};
pub use stock::{
    CompareRequest, ComparisonAnalysis, ComparisonResult, DividendComparison,
    FinancialHealthComparison, GrowthComparison, MarketSentiment, StockDetail,
    StockDetailQuery, StockSnapshot, ValueComparison,
};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User};
pub use watchlist::{AddToWatchlistRequest, WatchlistEntry};
pub use finance_question::{CreateFinanceQuestion, FinanceQuestion, FinanceQuestionCreated};
pub use order::{CancelOrderRequest, ModifyOrderRequest, OrderResponse, PlaceOrderRequest};
pub use llm::{ChatReply, ChatRequest, RecommendationRequest};
