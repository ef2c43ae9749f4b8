use crate::application_port::AuthError;
use crate::domain_model::{AccountRecord, UserId};
use crate::domain_port::AccountStore;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlAccountStore {
    pool: MySqlPool,
}

impl MySqlAccountStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAccountStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<AccountRecord, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let login: String = row
            .try_get("login")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let deleted_at: Option<DateTime<Utc>> = row
            .try_get("deleted_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(AccountRecord {
            id: UserId(id),
            login,
            password_hash,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

#[async_trait::async_trait]
impl AccountStore for MySqlAccountStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<AccountRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, login, password_hash, created_at, updated_at, deleted_at
FROM account
WHERE login = ? AND deleted_at IS NULL
"#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<AccountRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, login, password_hash, created_at, updated_at, deleted_at
FROM account
WHERE id = ?
"#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), AuthError> {
        sqlx::query(
            r#"
UPDATE account
SET password_hash = ?, updated_at = NOW(6)
WHERE id = ? AND deleted_at IS NULL
"#,
        )
        .bind(hash)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }
}
