use crate::application_port::AuthError;
use crate::domain_model::{AccountRecord, UserId};

/// Account collaborator. CRUD beyond password updates lives outside the
/// core; the core only reads identity and persists a new hash.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<AccountRecord>, AuthError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<AccountRecord>, AuthError>;

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), AuthError>;
}
