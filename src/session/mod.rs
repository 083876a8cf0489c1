pub mod models;

use crate::llm::ChatMessage;
use models::ChatSession;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Handle to one session's state. Holding the lock serialises that session's
/// requests; other sessions are unaffected.
pub type SessionHandle = Arc<tokio::sync::Mutex<ChatSession>>;

/// In-memory, per-process map from session id to chat state.
pub struct SessionStore {
    system: ChatMessage,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    /// `system` seeds every new or reset conversation.
    pub fn new(system: ChatMessage) -> Self {
        Self {
            system,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn system_message(&self) -> &ChatMessage {
        &self.system
    }

    /// Existing session, if any. Never inserts.
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Only a submitted message creates a session; reads and resets do not.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session = session_id, "creating session");
                Arc::new(tokio::sync::Mutex::new(ChatSession::new(self.system.clone())))
            })
            .clone()
    }

    /// An unknown session already looks reset, so it is left absent.
    pub async fn reset(&self, session_id: &str) {
        let Some(handle) = self.get(session_id) else {
            return;
        };
        let mut session = handle.lock().await;
        session.conversation.reset();
        session.last_usage = None;
    }

    /// Current messages; `[system]` for a session that does not exist yet.
    pub async fn snapshot(&self, session_id: &str) -> Vec<ChatMessage> {
        let Some(handle) = self.get(session_id) else {
            return vec![self.system.clone()];
        };
        let session = handle.lock().await;
        session.conversation.messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(ChatMessage::system("sys"))
    }

    #[tokio::test]
    async fn test_fresh_session_holds_system_message() {
        let store = store();
        assert_eq!(store.snapshot("a").await, vec![ChatMessage::system("sys")]);
        let handle = store.get_or_create("a");
        assert_eq!(
            handle.lock().await.conversation.messages(),
            &[ChatMessage::system("sys")]
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reads_do_not_create_sessions() {
        let store = store();
        assert!(store.get("a").is_none());
        assert_eq!(store.snapshot("a").await.len(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = store();
        store
            .get_or_create("a")
            .lock()
            .await
            .conversation
            .push(ChatMessage::user("only in a"));

        assert_eq!(store.snapshot("a").await.len(), 2);
        assert_eq!(store.snapshot("b").await.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_returns_to_system_only() {
        let store = store();
        {
            let handle = store.get_or_create("a");
            let mut session = handle.lock().await;
            for i in 0..7 {
                session.conversation.push(ChatMessage::user(format!("q{i}")));
            }
            session.last_usage = Some(Default::default());
        }

        store.reset("a").await;

        assert_eq!(store.snapshot("a").await, vec![ChatMessage::system("sys")]);
        assert!(store.get_or_create("a").lock().await.last_usage.is_none());
    }

    #[tokio::test]
    async fn test_reset_of_unknown_session_stores_nothing() {
        let store = store();
        store.reset("new").await;
        assert!(store.is_empty());
        assert_eq!(store.snapshot("new").await, vec![ChatMessage::system("sys")]);
    }
}
