use crate::api::v1::handler::ApiResponse;
use crate::application_port::AuthError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        Ok(warp::reply::with_status(json, StatusCode::OK))
    } else {
        let json = warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiError {
                code: ApiErrorCode::InternalError,
                message: format!("Unhandled error: {:?}", err),
            }),
        });
        Ok(warp::reply::with_status(
            json,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

/// Transport-neutral classes the whole taxonomy collapses into. Every
/// service error maps to exactly one of these.
#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Bad request")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Already exists")]
    Conflict,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::BadRequest => ApiErrorCode::BadRequest,
            AuthError::UserNotFound | AuthError::SessionNotFound => ApiErrorCode::NotFound,
            AuthError::IncorrectPassword => ApiErrorCode::PermissionDenied,
            AuthError::TokenInvalid | AuthError::TokenExpired => ApiErrorCode::Unauthenticated,
            AuthError::Conflict => ApiErrorCode::Conflict,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::Internal(e) => ApiErrorCode::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_mapping_is_total() {
        assert!(matches!(
            ApiErrorCode::from(AuthError::TokenExpired),
            ApiErrorCode::Unauthenticated
        ));
        assert!(matches!(
            ApiErrorCode::from(AuthError::SessionNotFound),
            ApiErrorCode::NotFound
        ));
        assert!(matches!(
            ApiErrorCode::from(AuthError::Store("boom".to_string())),
            ApiErrorCode::InternalError
        ));
    }

    #[test]
    fn error_envelope_serializes_flat() {
        let envelope =
            ApiResponse::<()>::err(ApiErrorCode::Unauthenticated, "token is not valid");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "Unauthenticated");
        assert_eq!(json["error"]["message"], "token is not valid");
    }
}
