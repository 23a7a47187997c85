pub mod auth_service;
pub mod forecasting_service;
pub mod llm_service;
pub mod recommendation_service;
pub mod scaler;
pub mod sequence_model;
pub mod session_store;
pub mod stock_service;
