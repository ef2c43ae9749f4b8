use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of one login. Rotation replaces credential values but
/// never the session id.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(SessionId)
    }
}

/// A signed token value together with its absolute expiry.
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Freshly minted access/refresh pair for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCredentials {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub access: Credential,
    pub refresh: Credential,
}

/// Durable row holding the single currently valid refresh token of a
/// session. Rotation overwrites `token` and `expires_at` in place.
#[derive(Debug, Clone)]
pub struct RefreshRecord {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
