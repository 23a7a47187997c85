use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, BrokerError};
use crate::models::{
    Broker, BrokerSession, CancelOrderRequest, ModifyOrderRequest, OrderResponse, PlaceOrderRequest,
    SessionCreated,
};
use crate::routes::session::{AngelSession, UpstoxSession};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Angel One
        .route("/broker/angel/session", post(create_angel_session))
        .route("/broker/angel/holdings", get(angel_holdings))
        .route("/place_order", post(place_order))
        .route("/modify_order", post(modify_order))
        .route("/cancel_order", post(cancel_order))
        // Upstox
        .route("/upstox/login", post(upstox_login))
        .route("/upstox/callback", post(upstox_callback))
        .route("/upstox/holdings", get(upstox_holdings))
}

#[derive(Debug, Deserialize)]
struct AngelLoginRequest {
    client_code: Option<String>,
    password: Option<String>,
    totp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstoxLoginRequest {
    client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstoxCallbackRequest {
    client_id: Option<String>,
    client_secret: Option<String>,
    code: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

/// Broker refusals keep the order-ticket shape the dashboard expects
fn order_failure(err: BrokerError) -> Response {
    match err {
        BrokerError::Rejected(message) => {
            warn!("Order rejected: {}", message);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response()
        }
        other => AppError::from(other).into_response(),
    }
}

/// POST /api/broker/angel/session
async fn create_angel_session(
    State(state): State<AppState>,
    Json(req): Json<AngelLoginRequest>,
) -> Result<Json<SessionCreated>, AppError> {
    let client_code = required(req.client_code, "client_code")?;
    let password = required(req.password, "password")?;
    let totp = required(req.totp, "totp")?;
    info!("POST /api/broker/angel/session - client {}", client_code);

    let tokens = state.angel.login(&client_code, &password, &totp).await?;

    let mut session = BrokerSession::new(Broker::AngelOne, tokens.access_token().to_string(), state.session_ttl);
    session.refresh_token = tokens.refresh_token.clone();
    session.feed_token = tokens.feed_token.clone();
    let expires_at = session.expires_at;
    let session_id = state.sessions.insert(session);

    Ok(Json(SessionCreated {
        message: "Login successful".to_string(),
        session_id,
        expires_at,
        access_token: None,
    }))
}

/// GET /api/broker/angel/holdings
async fn angel_holdings(
    State(state): State<AppState>,
    AngelSession(session): AngelSession,
) -> Result<Json<Vec<Value>>, AppError> {
    info!("GET /api/broker/angel/holdings (session {})", session.id);
    Ok(Json(state.angel.holdings_raw(&session).await?))
}

/// POST /api/place_order
async fn place_order(
    State(state): State<AppState>,
    AngelSession(session): AngelSession,
    Json(order): Json<PlaceOrderRequest>,
) -> Response {
    match state.angel.place_order(&session, &order).await {
        Ok(order_id) => Json(OrderResponse {
            status: "success".to_string(),
            order_id: Some(order_id),
            response: None,
        })
        .into_response(),
        Err(e) => order_failure(e),
    }
}

/// POST /api/modify_order
async fn modify_order(
    State(state): State<AppState>,
    AngelSession(session): AngelSession,
    Json(order): Json<ModifyOrderRequest>,
) -> Response {
    match state.angel.modify_order(&session, &order).await {
        Ok(response) => Json(OrderResponse {
            status: "success".to_string(),
            order_id: None,
            response: Some(response),
        })
        .into_response(),
        Err(e) => order_failure(e),
    }
}

/// POST /api/cancel_order
async fn cancel_order(
    State(state): State<AppState>,
    AngelSession(session): AngelSession,
    Json(order): Json<CancelOrderRequest>,
) -> Response {
    match state.angel.cancel_order(&session, &order).await {
        Ok(response) => Json(OrderResponse {
            status: "success".to_string(),
            order_id: None,
            response: Some(response),
        })
        .into_response(),
        Err(e) => order_failure(e),
    }
}

/// POST /api/upstox/login
/// Authorization dialog URL for the given app client id
async fn upstox_login(
    State(state): State<AppState>,
    Json(req): Json<UpstoxLoginRequest>,
) -> Result<Json<Value>, AppError> {
    let client_id = required(req.client_id, "client_id")?;
    info!("POST /api/upstox/login - client {}", client_id);

    let auth_url = state
        .upstox
        .authorization_url(&client_id, &Uuid::new_v4().simple().to_string())?;
    Ok(Json(json!({ "auth_url": auth_url })))
}

/// POST /api/upstox/callback
async fn upstox_callback(
    State(state): State<AppState>,
    Json(req): Json<UpstoxCallbackRequest>,
) -> Result<Json<SessionCreated>, AppError> {
    let client_id = required(req.client_id, "client_id")?;
    let client_secret = required(req.client_secret, "client_secret")?;
    let code = required(req.code, "code")?;
    info!("POST /api/upstox/callback - client {}", client_id);

    let token = state.upstox.exchange_code(&client_id, &client_secret, &code).await?;

    let mut session = BrokerSession::new(Broker::Upstox, token.access_token.clone(), state.session_ttl);
    session.refresh_token = token.extended_token.clone();
    let expires_at = session.expires_at;
    let session_id = state.sessions.insert(session);

    Ok(Json(SessionCreated {
        message: "Login successful".to_string(),
        session_id,
        expires_at,
        access_token: Some(token.access_token),
    }))
}

/// GET /api/upstox/holdings
async fn upstox_holdings(
    State(state): State<AppState>,
    UpstoxSession(session): UpstoxSession,
) -> Result<Json<Vec<Value>>, AppError> {
    info!("GET /api/upstox/holdings (session {})", session.id);
    Ok(Json(state.upstox.holdings(&session).await?))
}
