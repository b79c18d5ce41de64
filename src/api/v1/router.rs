use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::PublicUser;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .and_then(handler::health);

    let register = warp::post()
        .and(warp::path("users"))
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("users"))
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("users"))
        .and(warp::path("refresh-token"))
        .and(warp::path::end())
        .and(warp::cookie::optional(handler::REFRESH_COOKIE))
        .and(warp::body::bytes())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh_token);

    let logout = warp::post()
        .and(warp::path("users"))
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path("users"))
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and_then(handler::current_user);

    let change_password = warp::patch()
        .and(warp::path("users"))
        .and(warp::path("change-password"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::change_password);

    let update_details = warp::patch()
        .and(warp::path("users"))
        .and(warp::path("update-details"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::update_details);

    health
        .or(register)
        .or(login)
        .or(refresh)
        .or(logout)
        .or(me)
        .or(change_password)
        .or(update_details)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Protected-route gate: access token from the `access_token` cookie or the
/// bearer header, resolved to a `PublicUser` or rejected. The cookie wins
/// when both are present.
fn with_authentication(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (PublicUser,), Error = warp::Rejection> + Clone {
    warp::cookie::optional(handler::ACCESS_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .and_then(move |cookie: Option<String>, header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let bearer = header
                    .as_deref()
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .map(str::to_string);
                let token = cookie
                    .or(bearer)
                    .ok_or_else(|| reject::custom(ApiErrorCode::Unauthenticated))?;

                auth_service
                    .authenticate(&token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        })
}
