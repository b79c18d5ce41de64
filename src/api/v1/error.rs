use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        Ok(warp::reply::with_status(json, err.status()))
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

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Unauthorized request")]
    Unauthenticated,
    #[error("Invalid username/email or password")]
    InvalidCredentials,
    #[error("User with same username or email already exists")]
    UserExists,
    #[error("User not found")]
    UserNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::UserExists => StatusCode::CONFLICT,
            ApiErrorCode::UserNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Validation(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            // Every token-validation failure collapses to one generic 401;
            // the distinction (expired vs forged vs reused vs logged out)
            // only ever reaches the logs.
            AuthError::Unauthenticated
            | AuthError::InvalidToken
            | AuthError::SessionNotFound
            | AuthError::TokenReused => {
                debug!("authentication failure: {error}");
                ApiErrorCode::Unauthenticated
            }
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::UserExists => ApiErrorCode::UserExists,
            AuthError::PrincipalNotFound => ApiErrorCode::UserNotFound,
            AuthError::Validation(message) => ApiErrorCode::Validation(message),
            AuthError::Encoding(e) | AuthError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}
