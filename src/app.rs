use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{auth, brokers, finance_questions, forecasts, health, llm, stocks, watchlists};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::<AppState>::new()
        .merge(forecasts::router())
        .merge(stocks::router())
        .merge(brokers::router())
        .merge(llm::router())
        .merge(auth::router())
        .merge(watchlists::router())
        .merge(finance_questions::router());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
