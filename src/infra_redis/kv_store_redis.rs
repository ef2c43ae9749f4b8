use crate::application_port::AuthError;
use crate::domain_port::KvStore;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Redis-backed KvStore. Keys are prefixed per deployment and every entry
/// carries a default TTL so orphaned cache entries age out on their own.
pub struct RedisKvStore {
    conn: ConnectionManager,
    prefix: String,
    default_ttl_secs: u64,
}

impl RedisKvStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, default_ttl_secs: u64) -> Self {
        RedisKvStore {
            conn,
            prefix: prefix.into(),
            default_ttl_secs,
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait::async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, value, self.default_ttl_secs)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}
