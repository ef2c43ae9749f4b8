use crate::application_port::AuthError;
use crate::domain_model::{RefreshRecord, SessionId, UserId};
use crate::domain_port::RefreshLedger;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryRefreshLedger {
    records: DashMap<(UserId, SessionId), RefreshRecord>,
}

impl MemoryRefreshLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RefreshLedger for MemoryRefreshLedger {
    async fn get(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<RefreshRecord>, AuthError> {
        Ok(self
            .records
            .get(&(user_id, session_id))
            .map(|r| r.value().clone()))
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<RefreshRecord>, AuthError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn insert(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        let key = (record.user_id, record.session_id);
        if self.records.contains_key(&key) {
            return Err(AuthError::Conflict);
        }
        self.records.insert(key, record.clone());
        Ok(())
    }

    async fn update_token_and_expiry(
        &self,
        user_id: UserId,
        session_id: SessionId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut record = self
            .records
            .get_mut(&(user_id, session_id))
            .ok_or_else(|| AuthError::Store("refresh record missing".to_string()))?;
        record.token = token.to_string();
        record.expires_at = expires_at;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_one(&self, user_id: UserId, session_id: SessionId) -> Result<(), AuthError> {
        self.records.remove(&(user_id, session_id));
        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), AuthError> {
        self.records.retain(|key, _| key.0 != user_id);
        Ok(())
    }
}
