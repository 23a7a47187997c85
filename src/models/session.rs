use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Broker {
    AngelOne,
    Upstox,
}

/// Tokens for one logged-in brokerage account.
///
/// Handlers receive this explicitly; nothing reads broker credentials from
/// process-wide state.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerSession {
    pub id: Uuid,
    pub broker: Broker,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub feed_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl BrokerSession {
    pub fn new(broker: Broker, access_token: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            broker,
            access_token,
            refresh_token: None,
            feed_token: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub message: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}
