use crate::application_port::AuthError;

/// Volatile key-value collaborator backing the session cache. Shared by
/// many service instances; no in-process locking on top of it.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AuthError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), AuthError>;

    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;
}
