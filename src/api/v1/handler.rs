use super::error::*;
use crate::application_port::*;
use crate::domain_model::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::{self, StatusCode, header};
use warp::hyper::Body;
use warp::hyper::body::Bytes;
use warp::reject;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

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

fn auth_cookie(name: &str, value: &str, expires_at: DateTime<Utc>) -> String {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    // Secure is dropped in debug builds so local plain-HTTP clients work.
    let secure = if cfg!(debug_assertions) { "" } else { "; Secure" };
    format!("{name}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age}{secure}")
}

fn expired_cookie(name: &str) -> String {
    let secure = if cfg!(debug_assertions) { "" } else { "; Secure" };
    format!("{name}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{secure}")
}

fn token_cookies(tokens: &AuthTokens) -> [String; 2] {
    [
        auth_cookie(
            ACCESS_COOKIE,
            &tokens.access_token.0,
            tokens.access_token_expires_at,
        ),
        auth_cookie(
            REFRESH_COOKIE,
            &tokens.refresh_token.0,
            tokens.refresh_token_expires_at,
        ),
    ]
}

/// `warp::reply::with_header` replaces on repeat, so multi-cookie responses
/// are built on the raw response builder, which appends.
fn json_with_cookies<T: Serialize>(
    status: StatusCode,
    payload: &ApiResponse<T>,
    cookies: &[String],
) -> Result<http::Response<Body>, warp::Rejection> {
    let body = serde_json::to_vec(payload)
        .map_err(ApiErrorCode::internal)
        .map_err(reject::custom)?;

    let mut builder = http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json");
    for cookie in cookies {
        builder = builder.header(header::SET_COOKIE, cookie.as_str());
    }

    builder
        .body(Body::from(body))
        .map_err(ApiErrorCode::internal)
        .map_err(reject::custom)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(HealthResponse {
        status: "ok",
    })))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

pub async fn register(
    body: RegisterRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = account_service
        .register(RegisterInput {
            username: body.username,
            email: body.email,
            full_name: body.full_name,
            password: body.password,
            avatar_url: body.avatar_url,
            cover_image_url: body.cover_image_url,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    json_with_cookies(StatusCode::CREATED, &ApiResponse::ok(user), &[])
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub tokens: AuthTokens,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login = body
        .username
        .or(body.email)
        .filter(|login| !login.trim().is_empty())
        .ok_or_else(|| {
            reject::custom(ApiErrorCode::Validation(
                "username or email is required".to_string(),
            ))
        })?;

    let result = auth_service
        .login(LoginInput {
            login,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookies = token_cookies(&result.tokens);
    let response = LoginResponse {
        user: result.user,
        tokens: result.tokens,
    };
    json_with_cookies(StatusCode::OK, &ApiResponse::ok(response), &cookies)
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

pub async fn refresh_token(
    cookie: Option<String>,
    body: Bytes,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    // Cookie first, JSON body as the fallback for non-browser clients.
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| reject::custom(ApiErrorCode::Validation(format!("invalid body: {e}"))))?
            .refresh_token
    };
    let presented = cookie.or(from_body).ok_or_else(|| {
        reject::custom(ApiErrorCode::Validation(
            "refresh token is required".to_string(),
        ))
    })?;

    let tokens = auth_service
        .refresh(&presented)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookies = token_cookies(&tokens);
    json_with_cookies(StatusCode::OK, &ApiResponse::ok(tokens), &cookies)
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

pub async fn logout(
    user: PublicUser,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(user.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let cookies = [expired_cookie(ACCESS_COOKIE), expired_cookie(REFRESH_COOKIE)];
    json_with_cookies(StatusCode::OK, &ApiResponse::ok(LogoutResponse), &cookies)
}

pub async fn current_user(user: PublicUser) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse;

pub async fn change_password(
    body: ChangePasswordRequest,
    user: PublicUser,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    account_service
        .change_password(
            user.user_id,
            ChangePasswordInput {
                old_password: body.old_password,
                new_password: body.new_password,
            },
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ChangePasswordResponse)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

pub async fn update_details(
    body: UpdateAccountRequest,
    user: PublicUser,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let updated = account_service
        .update_account(
            user.user_id,
            UpdateAccountInput {
                username: body.username,
                email: body.email,
                full_name: body.full_name,
            },
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(updated)))
}
