use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Broker, BrokerSession};
use crate::services::session_store::SessionLookup;
use crate::state::AppState;

/// Header naming the broker session a request acts on
pub const SESSION_HEADER: &str = "x-session-id";

/// Session id from the request headers, if present and well formed
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

fn active_session(headers: &HeaderMap, state: &AppState, broker: Broker) -> Result<BrokerSession, AppError> {
    let id = session_id(headers).ok_or_else(|| {
        AppError::Unauthorized(format!("Missing or malformed {} header", SESSION_HEADER))
    })?;

    state
        .sessions
        .get_active(id, broker, Utc::now())
        .map_err(|reason| match reason {
            SessionLookup::Unknown => AppError::Unauthorized("Unknown broker session".to_string()),
            SessionLookup::Expired => {
                AppError::Unauthorized("Broker session expired, please log in again".to_string())
            }
            SessionLookup::WrongBroker => {
                AppError::Unauthorized(format!("Session is not a {:?} session", broker))
            }
        })
}

/// A live Angel One session, resolved from `x-session-id`
pub struct AngelSession(pub BrokerSession);

/// A live Upstox session, resolved from `x-session-id`
pub struct UpstoxSession(pub BrokerSession);

#[async_trait]
impl FromRequestParts<AppState> for AngelSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        active_session(&parts.headers, state, Broker::AngelOne).map(AngelSession)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UpstoxSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        active_session(&parts.headers, state, Broker::Upstox).map(UpstoxSession)
    }
}
