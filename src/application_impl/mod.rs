mod access_guard_impl;
mod auth_service_impl;
mod credential_hasher_argon2;
mod refresh_session_manager_impl;
mod token_codec_jwt;
mod token_fingerprint;
mod wallet_service_impl;

pub use access_guard_impl::*;
pub use auth_service_impl::*;
pub use credential_hasher_argon2::*;
pub use refresh_session_manager_impl::*;
pub use token_codec_jwt::*;
pub use token_fingerprint::*;
pub use wallet_service_impl::*;

#[cfg(test)]
pub(crate) mod testing;
