use crate::application_impl::TokenCodec;
use crate::application_port::AuthError;
use crate::domain_model::{SessionCredentials, SessionId, UserId};
use crate::domain_port::KvStore;
use std::sync::Arc;

/// Dual-indexed session cache: payload bytes live under the access-token
/// value, and a pointer entry (session id -> access-token value) makes the
/// pair addressable by session id. Every write and delete keeps the two
/// keys paired.
#[derive(Clone)]
pub struct SessionCache {
    kv: Arc<dyn KvStore>,
    codec: Arc<TokenCodec>,
}

impl SessionCache {
    pub fn new(kv: Arc<dyn KvStore>, codec: Arc<TokenCodec>) -> Self {
        SessionCache { kv, codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub async fn get(&self, token: &str) -> Result<Option<Vec<u8>>, AuthError> {
        self.kv.get(token).await
    }

    /// Resolve the pointer, then the payload. Absence of either hop reads
    /// as the session being gone.
    pub async fn get_by_session_id(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Vec<u8>>, AuthError> {
        let Some(pointer) = self.kv.get(&session_id.to_string()).await? else {
            return Ok(None);
        };
        let token = Self::pointer_to_token(pointer)?;
        self.kv.get(&token).await
    }

    /// Mint a fresh pair and write payload + pointer. If the pointer write
    /// fails the payload entry is orphaned; it is unreachable by session id
    /// and left to age out, so only the error itself surfaces.
    pub async fn put(
        &self,
        user_id: UserId,
        session_id: SessionId,
        payload: Vec<u8>,
    ) -> Result<SessionCredentials, AuthError> {
        let minted = self.mint_pair(user_id, session_id)?;
        self.kv.set(&minted.access.value, payload).await?;
        self.kv
            .set(
                &session_id.to_string(),
                minted.access.value.clone().into_bytes(),
            )
            .await?;
        Ok(minted)
    }

    /// Replace the credential pair of an existing session. The old entries
    /// go first so the payload is never reachable under a superseded token;
    /// an already-missing pointer is tolerated.
    pub async fn rotate(
        &self,
        user_id: UserId,
        session_id: SessionId,
        payload: Vec<u8>,
    ) -> Result<SessionCredentials, AuthError> {
        let minted = self.mint_pair(user_id, session_id)?;
        self.delete_by_session_id(session_id).await?;
        self.kv.set(&minted.access.value, payload).await?;
        self.kv
            .set(
                &session_id.to_string(),
                minted.access.value.clone().into_bytes(),
            )
            .await?;
        Ok(minted)
    }

    /// Delete both entries of the pair the token belongs to. Idempotent.
    pub async fn delete(&self, token: &str) -> Result<(), AuthError> {
        let (_, session_id) = self.codec.parse(token)?;
        self.kv.delete(token).await?;
        self.kv.delete(&session_id.to_string()).await
    }

    /// Delete both entries, resolving the payload key via the pointer.
    /// Idempotent; a missing pointer only removes the pointer key.
    pub async fn delete_by_session_id(&self, session_id: SessionId) -> Result<(), AuthError> {
        let key = session_id.to_string();
        if let Some(pointer) = self.kv.get(&key).await? {
            let token = Self::pointer_to_token(pointer)?;
            self.kv.delete(&token).await?;
        }
        self.kv.delete(&key).await
    }

    /// Overwrite the payload in place. The pointer is untouched; writing
    /// over a missing entry silently recreates it.
    pub async fn update_payload(&self, token: &str, payload: Vec<u8>) -> Result<(), AuthError> {
        self.kv.set(token, payload).await
    }

    fn mint_pair(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<SessionCredentials, AuthError> {
        let access = self.codec.mint_access(user_id, session_id)?;
        let refresh = self.codec.mint_refresh(user_id, session_id)?;
        Ok(SessionCredentials {
            session_id,
            user_id,
            access,
            refresh,
        })
    }

    fn pointer_to_token(pointer: Vec<u8>) -> Result<String, AuthError> {
        String::from_utf8(pointer).map_err(|e| AuthError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::TokenCodecConfig;
    use crate::infra_memory::MemoryKvStore;
    use chrono::Duration;

    fn cache() -> (SessionCache, Arc<MemoryKvStore>) {
        let kv = Arc::new(MemoryKvStore::new());
        let codec = Arc::new(TokenCodec::new(TokenCodecConfig {
            signing_key: b"cache-test-key".to_vec(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::hours(24),
        }));
        (SessionCache::new(kv.clone(), codec), kv)
    }

    #[tokio::test]
    async fn put_writes_both_keys() {
        let (cache, kv) = cache();
        let session_id = SessionId::generate();
        let minted = cache.put(UserId(1), session_id, vec![1, 2, 3]).await.unwrap();

        assert_eq!(kv.len(), 2);
        assert_eq!(cache.get(&minted.access.value).await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(
            cache.get_by_session_id(session_id).await.unwrap(),
            Some(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn rotate_unlinks_old_access_token() {
        let (cache, _kv) = cache();
        let session_id = SessionId::generate();
        let old = cache.put(UserId(1), session_id, vec![9]).await.unwrap();
        let new = cache.rotate(UserId(1), session_id, vec![9]).await.unwrap();

        assert_ne!(old.access.value, new.access.value);
        assert_eq!(cache.get(&old.access.value).await.unwrap(), None);
        assert_eq!(cache.get(&new.access.value).await.unwrap(), Some(vec![9]));
        assert_eq!(cache.get_by_session_id(session_id).await.unwrap(), Some(vec![9]));
    }

    #[tokio::test]
    async fn rotate_tolerates_missing_pair() {
        let (cache, kv) = cache();
        let session_id = SessionId::generate();
        let minted = cache.rotate(UserId(1), session_id, vec![5]).await.unwrap();

        assert_eq!(kv.len(), 2);
        assert_eq!(cache.get(&minted.access.value).await.unwrap(), Some(vec![5]));
    }

    #[tokio::test]
    async fn delete_removes_both_keys_and_is_idempotent() {
        let (cache, kv) = cache();
        let session_id = SessionId::generate();
        let minted = cache.put(UserId(1), session_id, vec![1]).await.unwrap();

        cache.delete(&minted.access.value).await.unwrap();
        assert_eq!(kv.len(), 0);
        cache.delete(&minted.access.value).await.unwrap();

        cache.delete_by_session_id(session_id).await.unwrap();
    }

    #[tokio::test]
    async fn update_payload_keeps_pointer() {
        let (cache, _kv) = cache();
        let session_id = SessionId::generate();
        let minted = cache.put(UserId(1), session_id, vec![1]).await.unwrap();

        cache.update_payload(&minted.access.value, vec![2]).await.unwrap();
        assert_eq!(cache.get_by_session_id(session_id).await.unwrap(), Some(vec![2]));
    }
}
