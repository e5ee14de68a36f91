//! Connect-account sessions.
//!
//! A session records that a user went through the account connection flow for
//! a platform. It never holds credentials or cookies.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ScrapeError, ScrapeResult};
use crate::platform::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectSession {
    pub platform: Platform,
    pub connected: bool,
}

/// Storage for connect sessions; `put` replaces the whole value for an id
pub trait SessionStore: Send + Sync {
    fn put(&self, id: &str, session: ConnectSession);
    fn get(&self, id: &str) -> Option<ConnectSession>;
    fn any_connected(&self, platform: Platform) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, ConnectSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, id: &str, session: ConnectSession) {
        self.sessions.insert(id.to_string(), session);
    }

    fn get(&self, id: &str) -> Option<ConnectSession> {
        self.sessions.get(id).map(|entry| *entry.value())
    }

    fn any_connected(&self, platform: Platform) -> bool {
        self.sessions
            .iter()
            .any(|entry| entry.platform == platform && entry.connected)
    }
}

/// Response to starting a connection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectStart {
    pub session_id: String,
    pub login_url: String,
}

/// What a status query asks about
#[derive(Debug, Clone)]
pub enum StatusQuery {
    Session(String),
    Platform(Platform),
}

/// Connect-account flow over a [`SessionStore`]
#[derive(Clone)]
pub struct ConnectService {
    store: Arc<dyn SessionStore>,
}

impl ConnectService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    fn login_url(platform: Platform) -> &'static str {
        match platform {
            Platform::LinkedIn => "https://www.linkedin.com/login",
            Platform::Facebook => "https://www.facebook.com/login",
            Platform::GoogleBusiness => "https://accounts.google.com/",
        }
    }

    /// Open a pending session; only account-based platforms can connect
    pub fn start(&self, platform: &str) -> ScrapeResult<ConnectStart> {
        let platform = match platform {
            "facebook" => Platform::Facebook,
            "linkedin" => Platform::LinkedIn,
            _ => return Err(ScrapeError::invalid_input("Invalid platform")),
        };

        let session_id = uuid::Uuid::new_v4().simple().to_string();
        self.store.put(
            &session_id,
            ConnectSession {
                platform,
                connected: false,
            },
        );
        info!("Started {} connect session {}", platform, session_id);

        Ok(ConnectStart {
            session_id,
            login_url: Self::login_url(platform).to_string(),
        })
    }

    /// Mark a started session as connected
    pub fn callback(&self, session_id: &str) -> ScrapeResult<ConnectSession> {
        let mut session = self
            .store
            .get(session_id)
            .ok_or_else(|| ScrapeError::invalid_input(format!("Unknown session: {}", session_id)))?;

        session.connected = true;
        self.store.put(session_id, session);
        info!("Connect session {} completed for {}", session_id, session.platform);
        Ok(session)
    }

    /// Unknown sessions report not connected
    pub fn status(&self, query: &StatusQuery) -> bool {
        let connected = match query {
            StatusQuery::Session(id) => self.store.get(id).map(|s| s.connected).unwrap_or(false),
            StatusQuery::Platform(platform) => self.store.any_connected(*platform),
        };
        debug!("Connect status {:?}: {}", query, connected);
        connected
    }
}
