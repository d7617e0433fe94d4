mod user;
mod wallet;

pub use user::*;
pub use wallet::*;
