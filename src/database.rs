//! # Redis
//!
//! RAM database, shared by every instance of the service.
//!
//! Core purpose is the cross-instance state: the per-client request counters
//! and the cached word of the day. Both live behind atomic primitives so no
//! instance ever takes a lock.
//!
//! ## Requirements
//!
//! - Atomic increment with expiry for the rate counters
//! - Plain get/set with TTL for the daily cache entry
//! - Tiny dataset: one counter per active client plus one cache key
//!
//! Every operation is a suspension point; callers get cancellation for free
//! from dropping the future, and a completed increment is not rolled back.

use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("counter store unavailable: {0}")]
    Unavailable(&'static str),
}

/// The atomic key/value surface the core components run on. Keys are UTF-8
/// strings, values raw bytes; atomicity is the store's job, not the
/// caller's.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments the integer at `key`, creating it at 1.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Arms an expiry on `key`. Returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set_bytes(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.incr(key, 1i64).await?)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.expire(key, ttl.as_secs() as i64).await?)
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.get(key).await?)
    }

    async fn set_bytes(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.set_ex(key, value, ttl.as_secs()).await?)
    }
}

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}
