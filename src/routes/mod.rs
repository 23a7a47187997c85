pub(crate) mod auth;
pub(crate) mod brokers;
pub(crate) mod finance_questions;
pub(crate) mod forecasts;
pub(crate) mod health;
pub(crate) mod llm;
pub mod session;
pub(crate) mod stocks;
pub(crate) mod watchlists;
