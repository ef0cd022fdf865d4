//! Cache domain - value model, wire codec and the backend contract

pub mod backend;
pub mod codec;
pub mod error;
pub mod value;

pub use backend::{CacheBackend, CacheBackendExt};
pub use error::CacheError;
pub use value::CacheValue;

#[cfg(test)]
pub use backend::mock::MemoryBackend;
