use super::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    Unauthorized,
    TokenRevoked,
    InvalidToken,
    Conflict,
    ValidationError,
    NotFound,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthorized | ApiErrorCode::TokenRevoked | ApiErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A classified failure on its way to [`recover_error`]. `detail` is internal and
/// only rendered in development.
#[derive(Debug)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiRejection {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiRejection {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        tracing::error!("internal error: {error}");
        ApiRejection {
            code: ApiErrorCode::InternalError,
            message: "Internal server error".to_string(),
            detail: Some(error.to_string()),
        }
    }
}

impl reject::Reject for ApiRejection {}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::Validation(_) => ApiRejection::new(ApiErrorCode::ValidationError, message),
            AuthError::EmailTaken => ApiRejection::new(ApiErrorCode::Conflict, message),
            AuthError::Unauthorized(_) => ApiRejection::new(ApiErrorCode::Unauthorized, message),
            AuthError::TokenRevoked => ApiRejection::new(ApiErrorCode::TokenRevoked, message),
            AuthError::InvalidToken => ApiRejection::new(ApiErrorCode::InvalidToken, message),
            AuthError::Store(_) | AuthError::InternalError(_) => ApiRejection::internal(message),
        }
    }
}

impl From<WalletError> for ApiRejection {
    fn from(error: WalletError) -> Self {
        let message = error.to_string();
        match error {
            WalletError::Validation(_) => ApiRejection::new(ApiErrorCode::ValidationError, message),
            WalletError::NotFound => ApiRejection::new(ApiErrorCode::NotFound, message),
            WalletError::AddressTaken => ApiRejection::new(ApiErrorCode::Conflict, message),
            WalletError::Store(_) => ApiRejection::internal(message),
        }
    }
}

pub(super) fn rejection<E: Into<ApiRejection>>(error: E) -> Rejection {
    reject::custom(error.into())
}

fn classify(err: &Rejection) -> ApiRejection {
    if let Some(api) = err.find::<ApiRejection>() {
        return ApiRejection {
            code: api.code,
            message: api.message.clone(),
            detail: api.detail.clone(),
        };
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return ApiRejection {
            code: ApiErrorCode::ValidationError,
            message: "Invalid request body".to_string(),
            detail: Some(e.to_string()),
        };
    }
    if err.find::<reject::UnsupportedMediaType>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
    {
        return ApiRejection::new(ApiErrorCode::ValidationError, "Invalid request body");
    }
    if err.is_not_found() || err.find::<reject::MethodNotAllowed>().is_some() {
        return ApiRejection::new(ApiErrorCode::NotFound, "Route not found");
    }
    ApiRejection::internal(format!("unhandled rejection: {err:?}"))
}

/// Renders every rejection as the error envelope. `expose_detail` adds
/// `error.details` and is only set in development.
pub async fn recover_error(
    err: Rejection,
    expose_detail: bool,
) -> Result<impl warp::Reply, Infallible> {
    let ApiRejection {
        code,
        message,
        detail,
    } = classify(&err);

    let response = ApiResponse::<()>::err(ApiError {
        code,
        message,
        details: detail.filter(|_| expose_detail),
    });
    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        code.status(),
    ))
}
