use crate::application_impl::SessionCache;
use crate::application_port::{
    AuthError, CredentialHasher, LoginInput, SessionInfo, SessionService, ValidatedToken,
};
use crate::domain_model::{AccountRecord, RefreshRecord, SessionCredentials, SessionId, UserId};
use crate::domain_port::{AccountStore, RefreshLedger};
use crate::logger::*;
use chrono::Utc;
use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;

/// Session lifecycle orchestrator over the account collaborator, the
/// refresh ledger and the dual-indexed cache. Holds no per-session lock;
/// same-session races are resolved by the replay check and by the cache
/// being the liveness authority.
pub struct RealSessionService {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn RefreshLedger>,
    cache: SessionCache,
    credential_hasher: Arc<dyn CredentialHasher>,
    revoke_concurrency: usize,
}

impl RealSessionService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn RefreshLedger>,
        cache: SessionCache,
        credential_hasher: Arc<dyn CredentialHasher>,
        revoke_concurrency: usize,
    ) -> Self {
        Self {
            accounts,
            ledger,
            cache,
            credential_hasher,
            revoke_concurrency: revoke_concurrency.max(1),
        }
    }

    async fn live_account(&self, user_id: UserId) -> Result<Option<AccountRecord>, AuthError> {
        let account = self.accounts.find_by_id(user_id).await?;
        Ok(account.filter(|a| !a.is_deleted()))
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn login(&self, request: LoginInput) -> Result<SessionCredentials, AuthError> {
        if request.login.is_empty() || request.password.is_empty() {
            return Err(AuthError::BadRequest);
        }

        let account = match self.accounts.find_by_login(&request.login).await {
            Ok(account) => account.filter(|a| !a.is_deleted()),
            Err(e) => {
                error!(error = %e, login = %request.login, "can't get account by login");
                return Err(e);
            }
        };
        let Some(account) = account else {
            info!(login = %request.login, "account not found");
            return Err(AuthError::UserNotFound);
        };

        let password_ok = self
            .credential_hasher
            .verify_password(&request.password, &account.password_hash)
            .await?;
        if !password_ok {
            return Err(AuthError::IncorrectPassword);
        }

        let session_id = SessionId::generate();
        let minted = self
            .cache
            .put(account.id, session_id, request.payload)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %account.id, "can't create session"))?;

        let now = Utc::now();
        let record = RefreshRecord {
            user_id: account.id,
            session_id,
            token: minted.refresh.value.clone(),
            expires_at: minted.refresh.expires_at,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.ledger.insert(&record).await {
            // The cache must never hold a session with no durable record.
            // Best-effort compensation; a crash right here is the accepted
            // orphan window.
            if let Err(cleanup_err) = self.cache.delete_by_session_id(session_id).await {
                warn!(error = %cleanup_err, user_id = %account.id, session_id = %session_id,
                    "can't clean up session after ledger failure");
            }
            error!(error = %e, user_id = %account.id, "can't persist refresh record");
            return Err(e);
        }

        info!(user_id = %account.id, session_id = %session_id, "login");
        Ok(minted)
    }

    async fn logout(&self, token: &str) -> Result<SessionId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::BadRequest);
        }
        let (user_id, session_id) = self.cache.codec().parse(token)?;

        self.cache
            .delete(token)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't delete session"))?;

        self.ledger
            .delete_one(user_id, session_id)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't delete refresh record"))?;

        info!(user_id = %user_id, session_id = %session_id, "logout");
        Ok(session_id)
    }

    async fn change_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(AuthError::BadRequest);
        }
        let (user_id, _) = self.cache.codec().parse(token)?;

        let payload = self
            .cache
            .get(token)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't get session data"))?;
        if payload.is_none() {
            info!(user_id = %user_id, "session not found");
            return Err(AuthError::SessionNotFound);
        }

        let Some(account) = self.live_account(user_id).await? else {
            info!(user_id = %user_id, "account not found");
            return Err(AuthError::UserNotFound);
        };

        let hash = self.credential_hasher.hash_password(new_password).await?;
        self.accounts
            .update_password_hash(account.id, &hash)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't change password"))?;

        // Other sessions of the account stay valid on purpose.
        info!(user_id = %user_id, "password changed");
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionCredentials, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::BadRequest);
        }
        let (user_id, session_id) = self.cache.codec().parse(refresh_token)?;

        let record = self
            .ledger
            .get(user_id, session_id)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't load refresh record"))?;
        let Some(record) = record else {
            warn!(user_id = %user_id, session_id = %session_id, "refresh record not found");
            return Err(AuthError::BadRequest);
        };

        // Replay check: only the most recently issued value is accepted.
        if record.token != refresh_token {
            return Err(AuthError::TokenInvalid);
        }
        if record.is_expired() {
            warn!(user_id = %user_id, session_id = %session_id, "refresh token has expired");
            return Err(AuthError::TokenExpired);
        }

        // Best-effort payload carry-over; a missing entry rotates empty.
        let payload = match self.cache.get_by_session_id(session_id).await {
            Ok(payload) => payload.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "can't read session data");
                Vec::new()
            }
        };

        let minted = self
            .cache
            .rotate(user_id, session_id, payload)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't rotate session"))?;

        // Writing the new value back is what arms the replay check for the
        // token just consumed.
        self.ledger
            .update_token_and_expiry(
                user_id,
                session_id,
                &minted.refresh.value,
                minted.refresh.expires_at,
            )
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't update refresh record"))?;

        info!(user_id = %user_id, session_id = %session_id, "rotated credentials");
        Ok(minted)
    }

    async fn validate_token(&self, token: &str) -> Result<ValidatedToken, AuthError> {
        if token.is_empty() {
            return Err(AuthError::BadRequest);
        }
        let (user_id, session_id) = self
            .cache
            .codec()
            .parse(token)
            .map_err(|_| AuthError::TokenInvalid)?;

        let payload = match self.cache.get(token).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Err(AuthError::TokenInvalid),
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "can't get session data");
                return Err(AuthError::TokenInvalid);
            }
        };

        if self.live_account(user_id).await?.is_none() {
            return Err(AuthError::TokenInvalid);
        }

        Ok(ValidatedToken {
            user_id,
            session_id,
            payload,
        })
    }

    async fn update_session_data(&self, token: &str, payload: Vec<u8>) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::BadRequest);
        }
        let (user_id, _) = self.cache.codec().parse(token)?;

        self.cache
            .update_payload(token, payload)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't update session data"))?;

        info!(user_id = %user_id, "updated session data");
        Ok(())
    }

    async fn get_user_sessions(&self, token: &str) -> Result<Vec<SessionInfo>, AuthError> {
        if token.is_empty() {
            return Err(AuthError::BadRequest);
        }
        let (user_id, _) = self.cache.codec().parse(token)?;

        let records = self
            .ledger
            .list(user_id)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't list refresh records"))?;

        Ok(records
            .into_iter()
            .map(|r| SessionInfo {
                session_id: r.session_id,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn revoke_all_sessions(&self, user_id: UserId) -> Result<Vec<SessionId>, AuthError> {
        let records = self
            .ledger
            .list(user_id)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't list refresh records"))?;
        let session_ids: Vec<SessionId> = records.iter().map(|r| r.session_id).collect();

        // Independent keys, bounded fan-out. Every deletion must succeed
        // before any ledger row is removed; the first error aborts.
        futures_util::stream::iter(session_ids.iter().copied().map(|session_id| {
            let cache = self.cache.clone();
            async move { cache.delete_by_session_id(session_id).await }
        }))
        .buffer_unordered(self.revoke_concurrency)
        .try_collect::<Vec<()>>()
        .await
        .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't delete session"))?;

        self.ledger
            .delete_all(user_id)
            .await
            .inspect_err(|e| error!(error = %e, user_id = %user_id, "can't delete refresh records"))?;

        info!(user_id = %user_id, sessions = session_ids.len(), "revoked all sessions");
        Ok(session_ids)
    }
}
