//! Per-user attendance drafts held between interactions.

use std::collections::HashMap;
use std::sync::Arc;

use serenity::all::UserId;
use tokio::sync::RwLock;

use crate::error::{DangerError, Result};

use super::session::SessionDraft;

/// Each Discord user has at most one draft. Drafts are never persisted, so
/// an abandoned one simply disappears with the process.
#[derive(Debug, Clone, Default)]
pub struct DraftStore(Arc<RwLock<HashMap<UserId, SessionDraft>>>);

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user: UserId) -> Result<SessionDraft> {
        self.0.read().await
            .get(&user)
            .cloned()
            .ok_or(DangerError::NoDraft)
    }

    /// Stores `draft`, replacing any draft the user already had.
    pub async fn put(&self, user: UserId, draft: SessionDraft) -> Option<SessionDraft> {
        self.0.write().await.insert(user, draft)
    }

    pub async fn take(&self, user: UserId) -> Option<SessionDraft> {
        self.0.write().await.remove(&user)
    }

    /// Runs a transition against the user's draft and keeps the result. The
    /// stored draft is only replaced when the transition succeeds.
    pub async fn update<F>(&self, user: UserId, transition: F) -> Result<SessionDraft>
    where
        F: FnOnce(&SessionDraft) -> Result<SessionDraft>,
    {
        let mut write_lock = self.0.write().await;

        let current = write_lock.get(&user).ok_or(DangerError::NoDraft)?;
        let next = transition(current)?;
        write_lock.insert(user, next.clone());

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::EventType;
    use crate::error::ValidationError;
    use crate::models::Alliance;

    fn draft() -> SessionDraft {
        SessionDraft::new(Alliance { alliance_id: 1, name: "DNG".to_string() }, "Joe", None).unwrap()
    }

    #[tokio::test]
    async fn update_without_draft_is_an_error() {
        let store = DraftStore::new();
        let res = store.update(UserId::new(1), |d| d.with_event_type(EventType::CrazyJoe)).await;
        assert!(matches!(res, Err(DangerError::NoDraft)));
    }

    #[tokio::test]
    async fn failed_transition_keeps_previous_draft() {
        let store = DraftStore::new();
        let user = UserId::new(1);
        store.put(user, draft()).await;

        let res = store.update(user, |d| d.with_legion(None)).await;
        assert!(matches!(res, Err(DangerError::Validation(ValidationError::EventTypeRequired))));
        assert_eq!(store.get(user).await.unwrap(), draft());

        let next = store.update(user, |d| d.with_event_type(EventType::CrazyJoe)).await.unwrap();
        assert_eq!(store.get(user).await.unwrap(), next);
    }

    #[tokio::test]
    async fn drafts_are_per_user() {
        let store = DraftStore::new();
        store.put(UserId::new(1), draft()).await;

        assert!(store.get(UserId::new(2)).await.is_err());
        assert!(store.take(UserId::new(1)).await.is_some());
        assert!(store.take(UserId::new(1)).await.is_none());
    }
}
