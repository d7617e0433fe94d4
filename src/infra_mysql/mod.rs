mod user_repo_mysql;
mod wallet_repo_mysql;

pub use user_repo_mysql::*;
pub use wallet_repo_mysql::*;

mod util;
