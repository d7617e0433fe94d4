use super::error::*;
use crate::application_port::*;
use crate::domain_model::{Chain, WalletId};
use crate::domain_port::{RevocationStore, UserRepo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: None,
            error: Some(error),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }
}

// region auth

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

pub async fn signup(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = auth_service
        .signup(SignupInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(rejection)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(result)),
        StatusCode::CREATED,
    ))
}

pub async fn signin(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = auth_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(rejection)?;

    Ok(warp::reply::json(&ApiResponse::ok(result)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh_token(&body.refresh_token)
        .await
        .map_err(rejection)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

pub async fn signout(
    ctx: AuthContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .sign_out(ctx.user_id, &ctx.token)
        .await
        .map_err(rejection)?;

    Ok(warp::reply::json(&ApiResponse::message(
        "Sign out successful",
    )))
}

// endregion

// region wallets

#[derive(Debug, Deserialize)]
pub struct CreateWalletRequest {
    pub tag: Option<String>,
    pub chain: Chain,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWalletRequest {
    pub tag: Option<String>,
    pub chain: Option<Chain>,
    pub address: Option<String>,
}

fn parse_wallet_id(raw: &str) -> Result<WalletId, warp::Rejection> {
    raw.parse::<WalletId>().map_err(|_| {
        rejection(ApiRejection::new(
            ApiErrorCode::ValidationError,
            "Invalid wallet id",
        ))
    })
}

pub async fn list_wallets(
    ctx: AuthContext,
    wallet_service: Arc<dyn WalletService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let wallets = wallet_service
        .list(ctx.user_id)
        .await
        .map_err(rejection)?;
    Ok(warp::reply::json(&ApiResponse::ok(wallets)))
}

pub async fn get_wallet(
    id: String,
    ctx: AuthContext,
    wallet_service: Arc<dyn WalletService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let wallet_id = parse_wallet_id(&id)?;
    let wallet = wallet_service
        .get(ctx.user_id, wallet_id)
        .await
        .map_err(rejection)?;
    Ok(warp::reply::json(&ApiResponse::ok(wallet)))
}

pub async fn create_wallet(
    ctx: AuthContext,
    body: CreateWalletRequest,
    wallet_service: Arc<dyn WalletService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let wallet = wallet_service
        .create(
            ctx.user_id,
            CreateWalletInput {
                tag: body.tag,
                chain: body.chain,
                address: body.address,
            },
        )
        .await
        .map_err(rejection)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(wallet)),
        StatusCode::CREATED,
    ))
}

pub async fn update_wallet(
    id: String,
    ctx: AuthContext,
    body: UpdateWalletRequest,
    wallet_service: Arc<dyn WalletService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let wallet_id = parse_wallet_id(&id)?;
    let wallet = wallet_service
        .update(
            ctx.user_id,
            wallet_id,
            UpdateWalletInput {
                tag: body.tag,
                chain: body.chain,
                address: body.address,
            },
        )
        .await
        .map_err(rejection)?;
    Ok(warp::reply::json(&ApiResponse::ok(wallet)))
}

pub async fn delete_wallet(
    id: String,
    ctx: AuthContext,
    wallet_service: Arc<dyn WalletService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let wallet_id = parse_wallet_id(&id)?;
    wallet_service
        .delete(ctx.user_id, wallet_id)
        .await
        .map_err(rejection)?;
    Ok(warp::reply::json(&ApiResponse::message(
        "Wallet deleted successfully",
    )))
}

// endregion

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    services: HealthServices,
}

#[derive(Debug, Serialize)]
struct HealthServices {
    store: &'static str,
    database: &'static str,
}

fn up_or_down(healthy: bool) -> &'static str {
    if healthy { "up" } else { "down" }
}

pub async fn health(
    store: Arc<dyn RevocationStore>,
    user_repo: Arc<dyn UserRepo>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (store_result, database_result) = tokio::join!(store.ping(), user_repo.ping());
    if let Err(e) = &store_result {
        tracing::warn!("health check: revocation store unreachable: {e}");
    }
    if let Err(e) = &database_result {
        tracing::warn!("health check: user store unreachable: {e}");
    }

    let healthy = store_result.is_ok() && database_result.is_ok();
    let report = HealthReport {
        status: if healthy { "healthy" } else { "unhealthy" },
        services: HealthServices {
            store: up_or_down(store_result.is_ok()),
            database: up_or_down(database_result.is_ok()),
        },
    };
    let response = ApiResponse {
        success: healthy,
        data: Some(report),
        message: None,
        error: None,
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok(warp::reply::with_status(warp::reply::json(&response), status))
}
