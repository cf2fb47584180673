pub mod database;
pub mod memory_store;
pub mod rate_limiter;
