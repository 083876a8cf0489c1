//! Shared application state for the chat server.

use crate::config::Settings;
use crate::llm::Provider;
use crate::session::SessionStore;

/// Immutable configuration and the shared inference client, plus the
/// per-session store. One instance per process, behind an `Arc`.
pub struct AppState {
    pub settings: Settings,
    pub provider: Provider,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let provider = Provider::new(settings.llm.clone());
        let sessions = SessionStore::new(settings.policy.system_message());
        Self {
            settings,
            provider,
            sessions,
        }
    }
}
