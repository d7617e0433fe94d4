mod revocation_store_memory;
mod user_repo_memory;
mod wallet_repo_memory;

pub use revocation_store_memory::*;
pub use user_repo_memory::*;
pub use wallet_repo_memory::*;
