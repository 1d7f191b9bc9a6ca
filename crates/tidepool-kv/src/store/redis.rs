//! Redis store
//!
//! One multiplexed async connection per store. The selected database belongs
//! to that connection, so the store never reconnects behind the caller's
//! back; a dropped connection surfaces as a store error.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Pipeline};
use std::time::Duration;
use tracing::debug;

use super::KvStore;
use crate::error::{KvError, KvResult};

/// Redis-backed [`KvStore`]
pub struct RedisStore {
    client: Client,
    conn: Option<MultiplexedConnection>,
}

impl RedisStore {
    /// Create a store for the given URL without connecting
    pub fn open(url: &str) -> KvResult<Self> {
        let client = Client::open(url)
            .map_err(|e| KvError::Configuration(format!("Invalid Redis URL '{}': {}", url, e)))?;
        Ok(Self { client, conn: None })
    }

    /// Clone of the open connection handle
    fn conn(&self) -> KvResult<MultiplexedConnection> {
        self.conn.clone().ok_or(KvError::NotConnected)
    }
}

fn set_pipeline(entries: &[(String, String)], ttl: Option<Duration>) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();
    for (key, value) in entries {
        match ttl {
            Some(ttl) => pipe.set_ex(key, value, ttl.as_secs()).ignore(),
            None => pipe.set(key, value).ignore(),
        };
    }
    pipe
}

fn expire_pipeline(keys: &[String], ttl: Duration) -> Pipeline {
    let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    let mut pipe = redis::pipe();
    pipe.atomic();
    for key in keys {
        pipe.exists(key).ignore();
        pipe.expire(key, seconds).ignore();
    }
    pipe
}

#[async_trait]
impl KvStore for RedisStore {
    async fn connect(&mut self) -> KvResult<()> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| KvError::Connection(format!("Failed to connect: {}", e)))?;
        self.conn = Some(conn);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn close(&mut self) {
        self.conn = None;
    }

    async fn select(&self, db: i64) -> KvResult<()> {
        let mut conn = self.conn()?;
        let _: () = redis::cmd("SELECT").arg(db).query_async(&mut conn).await?;
        Ok(())
    }

    async fn quit(&mut self) -> KvResult<String> {
        let mut conn = self.conn.take().ok_or(KvError::NotConnected)?;
        let status: String = redis::cmd("QUIT").query_async(&mut conn).await?;
        Ok(status)
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn()?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let mut conn = self.conn()?;
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Option<String>>> {
        let mut conn = self.conn()?;
        let values: Vec<Option<String>> = conn.mget(keys).await?;
        Ok(values)
    }

    async fn del(&self, keys: &[String]) -> KvResult<u64> {
        let mut conn = self.conn()?;
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        let mut conn = self.conn()?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> KvResult<(u64, Vec<String>)> {
        let mut conn = self.conn()?;
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        Ok((next, keys))
    }

    async fn set_many_atomic(&self, entries: &[(String, String)], ttl: Option<Duration>) -> KvResult<()> {
        let mut conn = self.conn()?;
        debug!(commands = entries.len(), "Executing SET pipeline");
        let _: () = set_pipeline(entries, ttl).query_async(&mut conn).await?;
        Ok(())
    }

    async fn expire_many_atomic(&self, keys: &[String], ttl: Duration) -> KvResult<()> {
        let mut conn = self.conn()?;
        debug!(commands = keys.len() * 2, "Executing EXISTS/EXPIRE pipeline");
        let _: () = expire_pipeline(keys, ttl).query_async(&mut conn).await?;
        Ok(())
    }
}
