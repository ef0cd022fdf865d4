//! Redis cache backend implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use crate::domain::backend::{CacheBackend, NO_EXPIRY};
use crate::domain::codec::{decode, encode};
use crate::domain::error::CacheError;
use crate::domain::value::CacheValue;

/// Client options forwarded to the Redis connection.
///
/// This is a closed set rather than an open option bag: only the options the
/// backend actually supports are representable, and the one known to be
/// incompatible is rejected at construction.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Timeout for establishing a connection
    pub connection_timeout: Option<Duration>,
    /// Timeout for a single command round-trip
    pub response_timeout: Option<Duration>,
    /// Asks the client to decode byte replies to text. Not supported: the
    /// backend manages its own byte-tagged encoding, and a text-decoding
    /// client would corrupt it. Construction fails if set.
    pub decode_responses: bool,
}

impl ClientOptions {
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }
}

/// Configuration for the Redis cache backend
#[derive(Debug, Clone)]
pub struct RedisBackendConfig {
    /// Address of the Redis server
    pub host: String,
    /// Port the Redis server listens on
    pub port: u16,
    /// Password authentication for the Redis server
    pub password: Option<String>,
    /// Zero-based numeric index of the logical database
    pub db: i64,
    /// Default timeout in seconds, used when an operation omits an explicit
    /// timeout. `0` means entries never expire.
    pub default_timeout_secs: i64,
    /// Prefix prepended verbatim to every logical key to form the physical
    /// key. The prefix carries its own separator, if any.
    pub key_prefix: Option<String>,
    /// Connection options passed through to the client
    pub client: ClientOptions,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            default_timeout_secs: 300,
            key_prefix: None,
            client: ClientOptions::default(),
        }
    }
}

impl RedisBackendConfig {
    /// Creates a new configuration for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    pub fn with_default_timeout_secs(mut self, secs: i64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.client = options;
        self
    }

    /// Validates the configuration. Called before any network activity so
    /// configuration errors fail fast at construction.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.host.trim().is_empty() {
            return Err(CacheError::configuration("Redis host may not be empty"));
        }
        if self.client.decode_responses {
            return Err(CacheError::configuration(
                "decode_responses is not supported: the backend requires raw byte replies",
            ));
        }
        Ok(())
    }

    /// Substitutes the default timeout for `None`, then maps `0` to the
    /// no-expiry sentinel. Called by every mutating operation.
    pub fn normalize_timeout(&self, timeout: Option<i64>) -> i64 {
        let timeout = timeout.unwrap_or(self.default_timeout_secs);
        if timeout == 0 { NO_EXPIRY } else { timeout }
    }

    /// Forms the physical key for a logical key.
    pub fn prefix_key(&self, key: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// The configured prefix, if it namespaces anything.
    fn prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref().filter(|p| !p.is_empty())
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                username: None,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Redis cache backend.
///
/// Stateless apart from its configuration; the connection manager handle is
/// cloned per call, so one backend can be shared across concurrent callers.
///
/// Note: the connection manager establishes its first connection eagerly
/// inside [`RedisBackend::new`], unlike the lazy-connect convention of bare
/// clients.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
    config: RedisBackendConfig,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisBackend {
    /// Creates a new Redis backend from the given configuration.
    pub async fn new(config: RedisBackendConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let client = Client::open(config.connection_info())
            .map_err(|e| CacheError::configuration(format!("Failed to create Redis client: {}", e)))?;

        let mut manager_config = ConnectionManagerConfig::new();
        if let Some(timeout) = config.client.connection_timeout {
            manager_config = manager_config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = config.client.response_timeout {
            manager_config = manager_config.set_response_timeout(timeout);
        }

        let connection = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(|e| CacheError::store(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Creates a backend for the given host with default configuration.
    pub async fn with_host(host: impl Into<String>) -> Result<Self, CacheError> {
        Self::new(RedisBackendConfig::new(host)).await
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let raw: Option<Vec<u8>> = conn
            .get(&prefixed_key)
            .await
            .map_err(|e| CacheError::store(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(decode(raw.as_deref()))
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<CacheValue>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let prefixed_keys: Vec<String> =
            keys.iter().map(|key| self.config.prefix_key(key)).collect();
        let mut conn = self.connection.clone();

        // MGET preserves argument order and yields nil for missing keys, so
        // the result is positionally aligned with the input.
        let raw: Vec<Option<Vec<u8>>> = conn
            .mget(&prefixed_keys)
            .await
            .map_err(|e| CacheError::store(format!("Failed to get {} keys: {}", keys.len(), e)))?;

        Ok(raw.iter().map(|bytes| decode(bytes.as_deref())).collect())
    }

    async fn set(
        &self,
        key: &str,
        value: &CacheValue,
        timeout: Option<i64>,
    ) -> Result<bool, CacheError> {
        let timeout = self.config.normalize_timeout(timeout);
        let dump = encode(value)?;
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let ack: bool = if timeout == NO_EXPIRY {
            conn.set(&prefixed_key, dump)
                .await
                .map_err(|e| CacheError::store(format!("Failed to set key '{}': {}", key, e)))?
        } else {
            conn.set_ex(&prefixed_key, dump, timeout as u64)
                .await
                .map_err(|e| CacheError::store(format!("Failed to set key '{}': {}", key, e)))?
        };

        Ok(ack)
    }

    async fn set_many(
        &self,
        entries: &[(&str, CacheValue)],
        timeout: Option<i64>,
    ) -> Result<Vec<bool>, CacheError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let timeout = self.config.normalize_timeout(timeout);

        // Plain pipeline, no MULTI: sharded proxies cannot run transactions,
        // so the batch is explicitly not atomic.
        let mut pipe = redis::pipe();
        for (key, value) in entries {
            let dump = encode(value)?;
            let prefixed_key = self.config.prefix_key(key);
            if timeout == NO_EXPIRY {
                pipe.set(prefixed_key, dump);
            } else {
                pipe.set_ex(prefixed_key, dump, timeout as u64);
            }
        }

        let mut conn = self.connection.clone();
        let acks: Vec<bool> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::store(format!("Failed to set {} keys: {}", entries.len(), e)))?;

        Ok(acks)
    }

    async fn add(
        &self,
        key: &str,
        value: &CacheValue,
        timeout: Option<i64>,
    ) -> Result<bool, CacheError> {
        let timeout = self.config.normalize_timeout(timeout);
        let dump = encode(value)?;
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let created: bool = conn
            .set_nx(&prefixed_key, dump)
            .await
            .map_err(|e| CacheError::store(format!("Failed to add key '{}': {}", key, e)))?;

        if !created {
            return Ok(false);
        }

        // The sentinel is never forwarded to EXPIRE; a no-expiry add leaves
        // the freshly created key without a TTL.
        if timeout == NO_EXPIRY {
            return Ok(true);
        }

        let expired: bool = conn
            .expire(&prefixed_key, timeout)
            .await
            .map_err(|e| CacheError::store(format!("Failed to expire key '{}': {}", key, e)))?;

        Ok(expired)
    }

    async fn delete(&self, key: &str) -> Result<u64, CacheError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let removed: u64 = conn
            .del(&prefixed_key)
            .await
            .map_err(|e| CacheError::store(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(removed)
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<Option<u64>, CacheError> {
        if keys.is_empty() {
            return Ok(None);
        }
        let prefixed_keys: Vec<String> =
            keys.iter().map(|key| self.config.prefix_key(key)).collect();
        let mut conn = self.connection.clone();

        let removed: u64 = conn.del(&prefixed_keys).await.map_err(|e| {
            CacheError::store(format!("Failed to delete {} keys: {}", keys.len(), e))
        })?;

        Ok(Some(removed))
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let exists: bool = conn.exists(&prefixed_key).await.map_err(|e| {
            CacheError::store(format!("Failed to check existence of key '{}': {}", key, e))
        })?;

        Ok(exists)
    }

    /// With a key prefix configured this removes only the keys under the
    /// prefix. **Without a prefix it flushes the entire logical database**,
    /// destroying keys written by anyone else using that database; the
    /// returned count is the database size sampled just before the flush.
    async fn clear(&self) -> Result<u64, CacheError> {
        let mut conn = self.connection.clone();

        match self.config.prefix() {
            Some(prefix) => {
                let pattern = format!("{}*", prefix);
                let mut cursor = 0u64;
                let mut keys: Vec<String> = Vec::new();

                // SCAN instead of KEYS so a large keyspace does not stall the
                // server; the collected keys go out in one DEL batch.
                loop {
                    let (next_cursor, page): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn)
                        .await
                        .map_err(|e| {
                            CacheError::store(format!(
                                "Failed to scan keys with pattern '{}': {}",
                                pattern, e
                            ))
                        })?;

                    keys.extend(page);
                    cursor = next_cursor;

                    if cursor == 0 {
                        break;
                    }
                }

                if keys.is_empty() {
                    return Ok(0);
                }

                let removed: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| CacheError::store(format!("Failed to delete keys: {}", e)))?;

                Ok(removed)
            }
            None => {
                tracing::warn!(
                    db = self.config.db,
                    "Clearing cache without a key prefix flushes the entire Redis database"
                );

                let size: u64 = redis::cmd("DBSIZE")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| {
                        CacheError::store(format!("Failed to get database size: {}", e))
                    })?;

                redis::cmd("FLUSHDB")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| CacheError::store(format!("Failed to flush database: {}", e)))?;

                Ok(size)
            }
        }
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let new_value: i64 = conn.incr(&prefixed_key, delta).await.map_err(|e| {
            CacheError::store(format!("Failed to increment key '{}': {}", key, e))
        })?;

        Ok(new_value)
    }

    async fn decrement(&self, key: &str, delta: i64) -> Result<i64, CacheError> {
        let prefixed_key = self.config.prefix_key(key);
        let mut conn = self.connection.clone();

        let new_value: i64 = conn.incr(&prefixed_key, -delta).await.map_err(|e| {
            CacheError::store(format!("Failed to decrement key '{}': {}", key, e))
        })?;

        Ok(new_value)
    }
}
