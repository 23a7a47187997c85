pub mod angel_one;
pub mod csv_history;
pub mod market_data;
pub mod upstox;
pub mod yahoo_finance;
