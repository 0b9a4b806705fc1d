use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The current step of a user's onboarding/booking conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    AwaitingCalendarId,
    AwaitingDate,
    AwaitingTime,
    AwaitingName,
}

/// Transient fields accumulated mid-conversation.
///
/// `appointment_date_time` is only ever set once both a validated date and a
/// validated time exist; `desired_date_text` is cleared at that point.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    pub desired_date_text: Option<String>,
    pub appointment_date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    pub stage: Stage,
    pub scratch: Scratch,
}

impl ConversationSession {
    pub fn awaiting_calendar_id() -> Self {
        ConversationSession {
            stage: Stage::AwaitingCalendarId,
            scratch: Scratch::default(),
        }
    }
}

/// Process-wide map from user id to in-progress conversation.
///
/// Each user gets their own session slot behind its own lock: holding a
/// slot's lock for the length of a turn serializes turns for that user,
/// while distinct users contend only on the brief map lookup. A slot that
/// was never touched, or was cleared, reads as `Idle` with empty scratch.
///
/// Ephemeral by design: sessions die with the process and are re-initiable
/// via `/start`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<ConversationSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Handle to the user's session slot, created in the `Idle` rest state
    /// if absent. The map lock is released before this returns.
    pub async fn slot(&self, user_id: &str) -> Arc<Mutex<ConversationSession>> {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(user_id.to_string()).or_default().clone()
    }

    pub async fn get(&self, user_id: &str) -> Option<ConversationSession> {
        let slot = { self.sessions.lock().await.get(user_id).cloned() };
        match slot {
            Some(slot) => Some(slot.lock().await.clone()),
            None => None,
        }
    }

    /// Current session for the user, or the `Idle` rest state.
    pub async fn current(&self, user_id: &str) -> ConversationSession {
        self.get(user_id).await.unwrap_or_default()
    }

    pub async fn put(&self, user_id: &str, session: ConversationSession) {
        let slot = self.slot(user_id).await;
        *slot.lock().await = session;
    }

    /// Reset the user to `Idle` with empty scratch.
    pub async fn clear(&self, user_id: &str) {
        let slot = { self.sessions.lock().await.get(user_id).cloned() };
        if let Some(slot) = slot {
            *slot.lock().await = ConversationSession::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_entry_reads_as_idle() {
        let store = SessionStore::new();
        let session = store.current("u1").await;
        assert_eq!(session.stage, Stage::Idle);
        assert!(session.scratch.desired_date_text.is_none());
    }

    #[tokio::test]
    async fn clear_resets_to_idle() {
        let store = SessionStore::new();
        store.put("u1", ConversationSession::awaiting_calendar_id()).await;
        assert_eq!(store.current("u1").await.stage, Stage::AwaitingCalendarId);
        store.clear("u1").await;
        assert_eq!(store.current("u1").await.stage, Stage::Idle);
    }

    #[tokio::test]
    async fn sessions_are_independent_per_user() {
        let store = SessionStore::new();
        store.put("u1", ConversationSession::awaiting_calendar_id()).await;
        assert_eq!(store.current("u2").await.stage, Stage::Idle);
        store.clear("u2").await;
        assert_eq!(store.current("u1").await.stage, Stage::AwaitingCalendarId);
    }

    #[tokio::test]
    async fn slot_is_stable_across_lookups() {
        let store = SessionStore::new();
        let first = store.slot("u1").await;
        let second = store.slot("u1").await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn locking_one_users_slot_leaves_others_free() {
        let store = SessionStore::new();
        let slot = store.slot("u1").await;
        let _held = slot.lock().await;
        // Another user's session is reachable while u1's turn is in flight.
        store.put("u2", ConversationSession::awaiting_calendar_id()).await;
        assert_eq!(store.current("u2").await.stage, Stage::AwaitingCalendarId);
    }
}
