use super::error::*;
use super::handler;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.session_service.clone()))
        .and_then(handler::login);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_bearer_token())
        .and(with(server.session_service.clone()))
        .and_then(handler::logout);

    let change_password = warp::post()
        .and(warp::path("change_password"))
        .and(warp::path::end())
        .and(with_bearer_token())
        .and(warp::body::json())
        .and(with(server.session_service.clone()))
        .and_then(handler::change_password);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.session_service.clone()))
        .and_then(handler::refresh);

    let validate = warp::post()
        .and(warp::path("validate"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.session_service.clone()))
        .and_then(handler::validate_token);

    let session_data = warp::post()
        .and(warp::path("session_data"))
        .and(warp::path::end())
        .and(with_bearer_token())
        .and(warp::body::json())
        .and(with(server.session_service.clone()))
        .and_then(handler::update_session_data);

    let sessions = warp::get()
        .and(warp::path("sessions"))
        .and(warp::path::end())
        .and(with_bearer_token())
        .and(with(server.session_service.clone()))
        .and_then(handler::get_user_sessions);

    let revoke_all = warp::post()
        .and(warp::path("revoke_all"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.session_service.clone()))
        .and_then(handler::revoke_all_sessions);

    login
        .or(logout)
        .or(change_password)
        .or(refresh)
        .or(validate)
        .or(session_data)
        .or(sessions)
        .or(revoke_all)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Extract the raw bearer token; the handlers own verification because most
/// operations act on the token itself.
fn with_bearer_token() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        |header: String| async move {
            if let Some(token) = header.strip_prefix("Bearer ") {
                Ok(token.to_string())
            } else {
                Err(reject::custom(ApiErrorCode::Unauthenticated))
            }
        },
    )
}
