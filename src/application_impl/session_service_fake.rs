use crate::application_port::*;
use crate::domain_model::{Credential, SessionCredentials, SessionId, UserId};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeSessionService;

impl FakeSessionService {
    pub fn new() -> Self {
        Self
    }
}

// Minimal fake implementation for frontend development against a fixed
// account. Extend with configurable responses when needed.
#[async_trait::async_trait]
impl SessionService for FakeSessionService {
    async fn login(&self, request: LoginInput) -> Result<SessionCredentials, AuthError> {
        Ok(fake_credentials(fake_user_id(&request.login), SessionId::generate()))
    }

    async fn logout(&self, token: &str) -> Result<SessionId, AuthError> {
        fake_session_id(token).ok_or(AuthError::TokenInvalid)
    }

    async fn change_password(&self, token: &str, _new_password: &str) -> Result<(), AuthError> {
        fake_session_id(token)
            .map(|_| ())
            .ok_or(AuthError::TokenInvalid)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionCredentials, AuthError> {
        let session_id = fake_session_id(refresh_token).ok_or(AuthError::TokenInvalid)?;
        Ok(fake_credentials(UserId(1), session_id))
    }

    async fn validate_token(&self, token: &str) -> Result<ValidatedToken, AuthError> {
        let session_id = fake_session_id(token).ok_or(AuthError::TokenInvalid)?;
        Ok(ValidatedToken {
            user_id: UserId(1),
            session_id,
            payload: Vec::new(),
        })
    }

    async fn update_session_data(&self, token: &str, _payload: Vec<u8>) -> Result<(), AuthError> {
        fake_session_id(token)
            .map(|_| ())
            .ok_or(AuthError::TokenInvalid)
    }

    async fn get_user_sessions(&self, token: &str) -> Result<Vec<SessionInfo>, AuthError> {
        let session_id = fake_session_id(token).ok_or(AuthError::TokenInvalid)?;
        Ok(vec![SessionInfo {
            session_id,
            created_at: Utc::now(),
        }])
    }

    async fn revoke_all_sessions(&self, _user_id: UserId) -> Result<Vec<SessionId>, AuthError> {
        Ok(Vec::new())
    }
}

fn fake_user_id(login: &str) -> UserId {
    UserId(login.len() as i64 + 1)
}

fn fake_session_id(token: &str) -> Option<SessionId> {
    token
        .strip_prefix("fake-token:")?
        .parse::<SessionId>()
        .ok()
}

fn fake_credentials(user_id: UserId, session_id: SessionId) -> SessionCredentials {
    let now = Utc::now();
    let value = format!("fake-token:{}", session_id);
    SessionCredentials {
        session_id,
        user_id,
        access: Credential {
            value: value.clone(),
            expires_at: now + Duration::hours(6),
        },
        refresh: Credential {
            value,
            expires_at: now + Duration::hours(24),
        },
    }
}
