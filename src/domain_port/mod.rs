// store

mod revocation_store;

pub use revocation_store::*;

// repo

mod user_repo;
mod wallet_repo;

pub use user_repo::*;
pub use wallet_repo::*;
