use crate::domain_model::{SessionCredentials, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Total error taxonomy of the core. Every failure reaching the boundary is
/// one of these kinds; collaborator-internal detail stays behind
/// `Store`/`Internal`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("bad request")]
    BadRequest,
    #[error("user not found")]
    UserNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token has expired")]
    TokenExpired,
    #[error("already exists")]
    Conflict,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub login: String,
    pub password: String,
    /// Opaque per-session payload cached alongside the credentials.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub payload: Vec<u8>,
}

/// Session metadata visible through enumeration. Cache payload is
/// per-request data and deliberately excluded.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Authenticate and open a new session: fresh session id, credential
    /// pair in the cache, refresh record in the ledger.
    async fn login(&self, request: LoginInput) -> Result<SessionCredentials, AuthError>;

    /// Terminate the session the token belongs to. Idempotent.
    async fn logout(&self, token: &str) -> Result<SessionId, AuthError>;

    /// Requires a live session for the presented access token. Other
    /// sessions of the account stay valid.
    async fn change_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Exchange an unconsumed refresh token for a new pair under the same
    /// session id.
    async fn refresh(&self, refresh_token: &str) -> Result<SessionCredentials, AuthError>;

    /// Cheap per-request check. The cache, not the token's embedded expiry,
    /// decides liveness.
    async fn validate_token(&self, token: &str) -> Result<ValidatedToken, AuthError>;

    /// Overwrite the cached payload of a live session.
    async fn update_session_data(&self, token: &str, payload: Vec<u8>) -> Result<(), AuthError>;

    /// Enumerate the caller's sessions from the ledger.
    async fn get_user_sessions(&self, token: &str) -> Result<Vec<SessionInfo>, AuthError>;

    /// Revocation primitive for the account collaborator: drop every cache
    /// pair of the user, then every ledger row. All-or-nothing on the cache
    /// side; the ledger is never partially cleaned up.
    async fn revoke_all_sessions(&self, user_id: UserId) -> Result<Vec<SessionId>, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}
