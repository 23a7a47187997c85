use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Broker, BrokerSession};

/// Why a session lookup did not yield a usable session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLookup {
    Unknown,
    Expired,
    WrongBroker,
}

/// In-memory broker sessions keyed by id. Sessions are lost on restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, BrokerSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: BrokerSession) -> Uuid {
        let id = session.id;
        info!("Opened {:?} session {}", session.broker, id);
        self.sessions.insert(id, session);
        id
    }

    /// Live session of the given broker. Expired sessions are evicted on
    /// the way out.
    pub fn get_active(&self, id: Uuid, broker: Broker, now: DateTime<Utc>) -> Result<BrokerSession, SessionLookup> {
        let session = match self.sessions.get(&id) {
            Some(entry) => entry.value().clone(),
            None => return Err(SessionLookup::Unknown),
        };

        if session.is_expired(now) {
            self.sessions.remove(&id);
            debug!("Evicted expired session {}", id);
            return Err(SessionLookup::Expired);
        }
        if session.broker != broker {
            return Err(SessionLookup::WrongBroker);
        }
        Ok(session)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Drops every expired session and returns how many went
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
