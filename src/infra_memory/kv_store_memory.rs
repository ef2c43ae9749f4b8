use crate::application_port::AuthError;
use crate::domain_port::KvStore;
use dashmap::DashMap;

/// In-process KvStore for the `memory` backend and the integration tests.
/// No TTL aging; entries live until deleted.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), AuthError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.entries.remove(key);
        Ok(())
    }
}
