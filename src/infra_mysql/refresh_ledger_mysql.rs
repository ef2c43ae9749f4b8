use super::util::is_dup_key;
use crate::application_port::AuthError;
use crate::domain_model::{RefreshRecord, SessionId, UserId};
use crate::domain_port::RefreshLedger;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlRefreshLedger {
    pool: MySqlPool,
}

impl MySqlRefreshLedger {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshLedger { pool }
    }

    #[inline]
    fn sid_as_bytes(id: &SessionId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn sid_from_bytes(id: &[u8]) -> Result<SessionId, AuthError> {
        Ok(SessionId(
            Uuid::from_slice(id).map_err(|e| AuthError::Store(e.to_string()))?,
        ))
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshRecord, AuthError> {
        let user_id: i64 = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let session_id_bytes: Vec<u8> = row
            .try_get("session_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let session_id = Self::sid_from_bytes(&session_id_bytes)?;
        let token: String = row
            .try_get("token")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(RefreshRecord {
            user_id: UserId(user_id),
            session_id,
            token,
            expires_at,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl RefreshLedger for MySqlRefreshLedger {
    async fn get(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<RefreshRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, session_id, token, expires_at, created_at, updated_at
FROM refresh_token
WHERE user_id = ? AND session_id = ?
"#,
        )
        .bind(user_id.0)
        .bind(Self::sid_as_bytes(&session_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<RefreshRecord>, AuthError> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, session_id, token, expires_at, created_at, updated_at
FROM refresh_token
WHERE user_id = ?
ORDER BY created_at
"#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn insert(&self, record: &RefreshRecord) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO refresh_token (user_id, session_id, token, expires_at, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(record.user_id.0)
        .bind(Self::sid_as_bytes(&record.session_id))
        .bind(&record.token)
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::Conflict
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn update_token_and_expiry(
        &self,
        user_id: UserId,
        session_id: SessionId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
UPDATE refresh_token
SET token = ?, expires_at = ?, updated_at = NOW(6)
WHERE user_id = ? AND session_id = ?
"#,
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id.0)
        .bind(Self::sid_as_bytes(&session_id))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn delete_one(&self, user_id: UserId, session_id: SessionId) -> Result<(), AuthError> {
        sqlx::query(
            r#"
DELETE FROM refresh_token
WHERE user_id = ? AND session_id = ?
"#,
        )
        .bind(user_id.0)
        .bind(Self::sid_as_bytes(&session_id))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), AuthError> {
        sqlx::query(
            r#"
DELETE FROM refresh_token
WHERE user_id = ?
"#,
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }
}
