use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use vestibule::application_impl::*;
use vestibule::application_port::*;
use vestibule::domain_model::*;
use vestibule::domain_port::*;
use vestibule::infra_memory::*;

struct Harness {
    service: RealSessionService,
    accounts: Arc<MemoryAccountStore>,
    ledger: Arc<MemoryRefreshLedger>,
    kv: Arc<MemoryKvStore>,
    bob: UserId,
}

async fn harness() -> Harness {
    let kv = Arc::new(MemoryKvStore::new());
    let accounts = Arc::new(MemoryAccountStore::new());
    let ledger = Arc::new(MemoryRefreshLedger::new());
    let hasher = Arc::new(Argon2PasswordHasher);

    let hash = hasher.hash_password("pw1").await.unwrap();
    let bob = accounts.add_account("bob", &hash).unwrap();

    let codec = Arc::new(TokenCodec::new(TokenCodecConfig {
        signing_key: b"integration-test-key".to_vec(),
        access_ttl: Duration::hours(6),
        refresh_ttl: Duration::hours(24),
    }));
    let cache = SessionCache::new(kv.clone(), codec);

    let service = RealSessionService::new(accounts.clone(), ledger.clone(), cache, hasher, 4);
    Harness {
        service,
        accounts,
        ledger,
        kv,
        bob,
    }
}

async fn login_bob(h: &Harness, payload: Vec<u8>) -> SessionCredentials {
    h.service
        .login(LoginInput {
            login: "bob".to_string(),
            password: "pw1".to_string(),
            payload,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn login_then_validate_returns_payload() {
    let h = harness().await;
    let minted = login_bob(&h, vec![120]).await;

    let validated = h.service.validate_token(&minted.access.value).await.unwrap();
    assert_eq!(validated.user_id, h.bob);
    assert_eq!(validated.session_id, minted.session_id);
    assert_eq!(validated.payload, vec![120]);
}

#[tokio::test]
async fn login_rejects_empty_and_bad_credentials() {
    let h = harness().await;

    let err = h
        .service
        .login(LoginInput {
            login: String::new(),
            password: "pw1".to_string(),
            payload: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::BadRequest));

    let err = h
        .service
        .login(LoginInput {
            login: "nobody".to_string(),
            password: "pw1".to_string(),
            payload: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));

    let err = h
        .service
        .login(LoginInput {
            login: "bob".to_string(),
            password: "wrong".to_string(),
            payload: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::IncorrectPassword));
}

#[tokio::test]
async fn validate_rejects_refresh_credential() {
    let h = harness().await;
    let minted = login_bob(&h, Vec::new()).await;

    // The payload lives under the access value only; a refresh credential
    // parses fine but always misses the cache.
    let err = h
        .service
        .validate_token(&minted.refresh.value)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));
}

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let h = harness().await;
    let minted = login_bob(&h, vec![7]).await;

    let rotated = h.service.refresh(&minted.refresh.value).await.unwrap();
    assert_eq!(rotated.session_id, minted.session_id);
    assert_ne!(rotated.refresh.value, minted.refresh.value);

    // Consumed value is dead.
    let err = h.service.refresh(&minted.refresh.value).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));

    // The fresh value works.
    h.service.refresh(&rotated.refresh.value).await.unwrap();
}

#[tokio::test]
async fn refresh_carries_payload_over() {
    let h = harness().await;
    let minted = login_bob(&h, vec![1, 2, 3]).await;

    let rotated = h.service.refresh(&minted.refresh.value).await.unwrap();
    let validated = h.service.validate_token(&rotated.access.value).await.unwrap();
    assert_eq!(validated.payload, vec![1, 2, 3]);
}

#[tokio::test]
async fn refresh_of_unknown_session_is_bad_request() {
    let h = harness().await;
    let minted = login_bob(&h, Vec::new()).await;
    h.service.logout(&minted.access.value).await.unwrap();

    let err = h.service.refresh(&minted.refresh.value).await.unwrap_err();
    assert!(matches!(err, AuthError::BadRequest));
}

#[tokio::test]
async fn refresh_rejects_expired_record() {
    let h = harness().await;
    let minted = login_bob(&h, Vec::new()).await;

    let past: DateTime<Utc> = Utc::now() - Duration::minutes(5);
    h.ledger
        .update_token_and_expiry(h.bob, minted.session_id, &minted.refresh.value, past)
        .await
        .unwrap();

    let err = h.service.refresh(&minted.refresh.value).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

#[tokio::test]
async fn logout_invalidates_and_is_idempotent() {
    let h = harness().await;
    let minted = login_bob(&h, Vec::new()).await;

    let session_id = h.service.logout(&minted.access.value).await.unwrap();
    assert_eq!(session_id, minted.session_id);

    let err = h
        .service
        .validate_token(&minted.access.value)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));

    // Record is gone, cache entries are gone; doing it again is a no-op.
    h.service.logout(&minted.access.value).await.unwrap();
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn end_to_end_rotation_flow() {
    let h = harness().await;
    let first = login_bob(&h, vec![120]).await;

    let validated = h.service.validate_token(&first.access.value).await.unwrap();
    assert_eq!(validated.user_id, h.bob);
    assert_eq!(validated.payload, vec![120]);

    let second = h.service.refresh(&first.refresh.value).await.unwrap();
    assert_eq!(second.session_id, first.session_id);

    let err = h
        .service
        .validate_token(&first.access.value)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));

    let validated = h.service.validate_token(&second.access.value).await.unwrap();
    assert_eq!(validated.session_id, first.session_id);
}

#[tokio::test]
async fn change_password_requires_live_session() {
    let h = harness().await;
    let minted = login_bob(&h, Vec::new()).await;
    h.service.logout(&minted.access.value).await.unwrap();

    let err = h
        .service
        .change_password(&minted.access.value, "pw2")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound));
}

#[tokio::test]
async fn change_password_keeps_other_sessions() {
    let h = harness().await;
    let first = login_bob(&h, Vec::new()).await;
    let second = login_bob(&h, Vec::new()).await;

    h.service
        .change_password(&first.access.value, "pw2")
        .await
        .unwrap();

    // Old password is dead, new one works.
    let err = h
        .service
        .login(LoginInput {
            login: "bob".to_string(),
            password: "pw1".to_string(),
            payload: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::IncorrectPassword));
    h.service
        .login(LoginInput {
            login: "bob".to_string(),
            password: "pw2".to_string(),
            payload: Vec::new(),
        })
        .await
        .unwrap();

    // Deliberate boundary: the other session is untouched.
    h.service.validate_token(&second.access.value).await.unwrap();
}

#[tokio::test]
async fn update_session_data_overwrites_payload() {
    let h = harness().await;
    let minted = login_bob(&h, vec![1]).await;

    h.service
        .update_session_data(&minted.access.value, vec![2, 2])
        .await
        .unwrap();

    let validated = h.service.validate_token(&minted.access.value).await.unwrap();
    assert_eq!(validated.payload, vec![2, 2]);
}

#[tokio::test]
async fn get_user_sessions_lists_ledger_records() {
    let h = harness().await;
    let first = login_bob(&h, Vec::new()).await;
    let second = login_bob(&h, Vec::new()).await;

    let sessions = h
        .service
        .get_user_sessions(&first.access.value)
        .await
        .unwrap();
    let ids: Vec<_> = sessions.iter().map(|s| s.session_id).collect();
    assert_eq!(sessions.len(), 2);
    assert!(ids.contains(&first.session_id));
    assert!(ids.contains(&second.session_id));
}

#[tokio::test]
async fn revoke_all_sessions_clears_ledger_and_cache() {
    let h = harness().await;
    let sessions = [
        login_bob(&h, Vec::new()).await,
        login_bob(&h, Vec::new()).await,
        login_bob(&h, Vec::new()).await,
    ];

    let revoked = h.service.revoke_all_sessions(h.bob).await.unwrap();
    assert_eq!(revoked.len(), 3);

    assert!(h.ledger.list(h.bob).await.unwrap().is_empty());
    assert!(h.kv.is_empty());
    for minted in &sessions {
        let err = h
            .service
            .validate_token(&minted.access.value)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }
}

#[tokio::test]
async fn validate_rejects_deleted_account() {
    let h = harness().await;
    let minted = login_bob(&h, Vec::new()).await;

    h.accounts.soft_delete(h.bob);

    let err = h
        .service
        .validate_token(&minted.access.value)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));
}

/// Ledger that refuses every insert, for exercising login compensation.
struct FailingLedger;

#[async_trait::async_trait]
impl RefreshLedger for FailingLedger {
    async fn get(
        &self,
        _user_id: UserId,
        _session_id: SessionId,
    ) -> Result<Option<RefreshRecord>, AuthError> {
        Ok(None)
    }

    async fn list(&self, _user_id: UserId) -> Result<Vec<RefreshRecord>, AuthError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _record: &RefreshRecord) -> Result<(), AuthError> {
        Err(AuthError::Store("ledger down".to_string()))
    }

    async fn update_token_and_expiry(
        &self,
        _user_id: UserId,
        _session_id: SessionId,
        _token: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        Err(AuthError::Store("ledger down".to_string()))
    }

    async fn delete_one(&self, _user_id: UserId, _session_id: SessionId) -> Result<(), AuthError> {
        Ok(())
    }

    async fn delete_all(&self, _user_id: UserId) -> Result<(), AuthError> {
        Ok(())
    }
}

#[tokio::test]
async fn login_rolls_back_cache_when_ledger_fails() {
    let kv = Arc::new(MemoryKvStore::new());
    let accounts = Arc::new(MemoryAccountStore::new());
    let hasher = Arc::new(Argon2PasswordHasher);
    let hash = hasher.hash_password("pw1").await.unwrap();
    accounts.add_account("bob", &hash).unwrap();

    let codec = Arc::new(TokenCodec::new(TokenCodecConfig {
        signing_key: b"integration-test-key".to_vec(),
        access_ttl: Duration::hours(6),
        refresh_ttl: Duration::hours(24),
    }));
    let service = RealSessionService::new(
        accounts,
        Arc::new(FailingLedger),
        SessionCache::new(kv.clone(), codec),
        hasher,
        4,
    );

    let err = service
        .login(LoginInput {
            login: "bob".to_string(),
            password: "pw1".to_string(),
            payload: vec![1],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Store(_)));

    // The cache never keeps a session with no durable record.
    assert!(kv.is_empty());
}
