//! redcache
//!
//! A Redis-backed cache adapter with support for:
//! - Tagged value encoding (compact integer fast path, JSON for everything else)
//! - Default-timeout substitution and a "never expire" sentinel
//! - Pipelined, non-transactional batch operations
//! - Key-prefix namespacing with prefix-scoped clearing

pub mod domain;
pub mod infrastructure;

pub use domain::backend::{CacheBackend, CacheBackendExt, NO_EXPIRY};
pub use domain::codec::{decode, encode};
pub use domain::error::CacheError;
pub use domain::value::CacheValue;
pub use infrastructure::redis::{ClientOptions, RedisBackend, RedisBackendConfig};
