use crate::application_port::AuthError;
use crate::domain_model::{AccountRecord, UserId};
use crate::domain_port::AccountStore;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug)]
pub struct MemoryAccountStore {
    accounts: DashMap<UserId, AccountRecord>,
    next_id: AtomicI64,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seed an account; used by tests and the `memory` backend.
    pub fn add_account(&self, login: &str, password_hash: &str) -> Result<UserId, AuthError> {
        if self.accounts.iter().any(|a| a.login == login) {
            return Err(AuthError::Conflict);
        }
        let id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        self.accounts.insert(
            id,
            AccountRecord {
                id,
                login: login.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
        );
        Ok(id)
    }

    pub fn soft_delete(&self, id: UserId) {
        if let Some(mut account) = self.accounts.get_mut(&id) {
            account.deleted_at = Some(Utc::now());
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<AccountRecord>, AuthError> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.login == login)
            .map(|a| a.value().clone()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<AccountRecord>, AuthError> {
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), AuthError> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or(AuthError::UserNotFound)?;
        account.password_hash = hash.to_string();
        account.updated_at = Utc::now();
        Ok(())
    }
}
