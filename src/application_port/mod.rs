mod auth_service;
mod wallet_service;

pub use auth_service::*;
pub use wallet_service::*;
