use super::error::*;
use super::handler;
use crate::application_port::{AccessGuard, AuthContext};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Every route with errors rendered as the JSON envelope.
pub fn app(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let expose_detail = server.expose_error_detail;
    routes(server)
        .recover(move |err: warp::Rejection| recover_error(err, expose_detail))
        .with(warp::trace::request())
}

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let signup = warp::path("auth")
        .and(warp::path("signup"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::signup);

    let signin = warp::path("auth")
        .and(warp::path("signin"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::signin);

    let refresh = warp::path("auth")
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let signout = warp::path("auth")
        .and(warp::path("signout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_auth(server.access_guard.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::signout);

    let list_wallets = warp::path("wallets")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_auth(server.access_guard.clone()))
        .and(with(server.wallet_service.clone()))
        .and_then(handler::list_wallets);

    let create_wallet = warp::path("wallets")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_auth(server.access_guard.clone()))
        .and(json_body())
        .and(with(server.wallet_service.clone()))
        .and_then(handler::create_wallet);

    let get_wallet = warp::path("wallets")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_auth(server.access_guard.clone()))
        .and(with(server.wallet_service.clone()))
        .and_then(handler::get_wallet);

    let update_wallet = warp::path("wallets")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::put())
        .and(with_auth(server.access_guard.clone()))
        .and(json_body())
        .and(with(server.wallet_service.clone()))
        .and_then(handler::update_wallet);

    let delete_wallet = warp::path("wallets")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_auth(server.access_guard.clone()))
        .and(with(server.wallet_service.clone()))
        .and_then(handler::delete_wallet);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with(server.revocation_store.clone()))
        .and(with(server.user_repo.clone()))
        .and_then(handler::health);

    signup
        .or(signin)
        .or(refresh)
        .or(signout)
        .or(list_wallets)
        .or(create_wallet)
        .or(get_wallet)
        .or(update_wallet)
        .or(delete_wallet)
        .or(health)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_auth(
    access_guard: Arc<dyn AccessGuard>,
) -> impl Filter<Extract = (AuthContext,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        move |authorization: Option<String>| {
            let access_guard = access_guard.clone();
            async move {
                access_guard
                    .authorize(authorization.as_deref())
                    .await
                    .map_err(rejection)
            }
        },
    )
}
