use super::error::*;
use crate::application_port::{LoginInput, SessionInfo, SessionService};
use crate::domain_model::{SessionCredentials, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub session_id: SessionId,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<SessionCredentials> for TokenPairResponse {
    fn from(minted: SessionCredentials) -> Self {
        TokenPairResponse {
            session_id: minted.session_id,
            access_token: minted.access.value,
            access_expires_at: minted.access.expires_at,
            refresh_token: minted.refresh.value,
            refresh_expires_at: minted.refresh.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub payload: Vec<u8>,
}

pub async fn login(
    body: LoginRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let minted = session_service
        .login(LoginInput {
            login: body.login,
            password: body.password,
            payload: body.payload,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(TokenPairResponse::from(minted));
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub session_id: SessionId,
}

pub async fn logout(
    token: String,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session_id = session_service
        .logout(&token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(LogoutResponse { session_id });
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub changed: bool,
}

pub async fn change_password(
    token: String,
    body: ChangePasswordRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    session_service
        .change_password(&token, &body.new_password)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(ChangePasswordResponse { changed: true });
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let minted = session_service
        .refresh(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(TokenPairResponse::from(minted));
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub payload: Vec<u8>,
}

pub async fn validate_token(
    body: ValidateRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let validated = session_service
        .validate_token(&body.token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(ValidateResponse {
        user_id: validated.user_id,
        session_id: validated.session_id,
        payload: validated.payload,
    });
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionDataRequest {
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct UpdateSessionDataResponse {
    pub updated: bool,
}

pub async fn update_session_data(
    token: String,
    body: UpdateSessionDataRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    session_service
        .update_session_data(&token, body.payload)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(UpdateSessionDataResponse { updated: true });
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionInfo>,
}

pub async fn get_user_sessions(
    token: String,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let sessions = session_service
        .get_user_sessions(&token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(SessionListResponse { sessions });
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Deserialize)]
pub struct RevokeAllRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RevokeAllResponse {
    pub session_ids: Vec<SessionId>,
}

/// Revocation primitive for the account-management collaborator.
pub async fn revoke_all_sessions(
    body: RevokeAllRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session_ids = session_service
        .revoke_all_sessions(UserId(body.user_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(RevokeAllResponse { session_ids });
    Ok(warp::reply::json(&api_response))
}
