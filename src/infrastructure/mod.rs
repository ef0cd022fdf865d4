//! Cache infrastructure - store-backed implementations

pub mod redis;

pub use redis::{ClientOptions, RedisBackend, RedisBackendConfig};
