use crate::application_port::AuthError;
use crate::domain_model::{RefreshRecord, SessionId, UserId};
use chrono::{DateTime, Utc};

/// Facade over the durable refresh-record collaborator. Pure CRUD; the
/// rotation/replay policy lives in the orchestrator.
#[async_trait::async_trait]
pub trait RefreshLedger: Send + Sync {
    async fn get(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<RefreshRecord>, AuthError>;

    async fn list(&self, user_id: UserId) -> Result<Vec<RefreshRecord>, AuthError>;

    /// At most one live record per (user, session).
    async fn insert(&self, record: &RefreshRecord) -> Result<(), AuthError>;

    /// Overwrite token and expiry of the existing record in place.
    async fn update_token_and_expiry(
        &self,
        user_id: UserId,
        session_id: SessionId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Deleting an absent record is not an error.
    async fn delete_one(&self, user_id: UserId, session_id: SessionId) -> Result<(), AuthError>;

    async fn delete_all(&self, user_id: UserId) -> Result<(), AuthError>;
}
