//! Redis-backed [`Store`] over a multiplexed connection manager.

use std::time::Duration;

use opentelemetry::KeyValue;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::Store;
use crate::error::Result;
use crate::telemetry::metrics;

/// Redis store handle. Cheap to clone; clones share one reconnecting
/// connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Round-trip a PING.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn conn(&self, operation: &'static str) -> ConnectionManager {
        metrics::store_operations().add(1, &[KeyValue::new("operation", operation)]);
        self.conn.clone()
    }
}

impl Store for RedisStore {
    async fn set_members(&self, set: &str) -> Result<Vec<String>> {
        Ok(self.conn("smembers").smembers(set).await?)
    }

    async fn add_to_set(&self, set: &str, member: &str) -> Result<()> {
        let _: usize = self.conn("sadd").sadd(set, member).await?;
        Ok(())
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool> {
        let removed: usize = self.conn("srem").srem(set, member).await?;
        Ok(removed > 0)
    }

    async fn key_exists(&self, key: &str) -> Result<bool> {
        Ok(self.conn("exists").exists(key).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.conn("get").get(key).await?)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        // PSETEX rejects a zero expiry.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = self.conn("psetex").pset_ex(key, value, millis).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let deleted: usize = self.conn("del").del(key).await?;
        Ok(deleted > 0)
    }

    async fn push(&self, list: &str, value: &str) -> Result<usize> {
        Ok(self.conn("lpush").lpush(list, value).await?)
    }

    async fn move_oldest(&self, source: &str, destination: &str) -> Result<Option<String>> {
        Ok(self
            .conn("rpoplpush")
            .rpoplpush(source, destination)
            .await?)
    }

    async fn remove_from_list(&self, list: &str, value: &str) -> Result<usize> {
        Ok(self.conn("lrem").lrem(list, 1, value).await?)
    }

    async fn list_len(&self, list: &str) -> Result<usize> {
        Ok(self.conn("llen").llen(list).await?)
    }

    async fn list_items(&self, list: &str) -> Result<Vec<String>> {
        Ok(self.conn("lrange").lrange(list, 0, -1).await?)
    }
}
