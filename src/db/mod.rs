pub mod finance_question_queries;
pub mod user_queries;
pub mod watchlist_queries;
