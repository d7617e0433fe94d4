mod revocation_store_redis;

pub use revocation_store_redis::*;
