//! In-memory store
//!
//! Process-local stand-in for Redis with the semantics the facade relies on:
//! numbered databases selected per connection, TTL expiry, glob MATCH, a
//! SCAN cursor that stays valid while keys are deleted, and all-or-nothing
//! pipelines. Expiry follows tokio's clock, so tests can pause and advance
//! time.
//!
//! Several connections can share one dataset through [`MemoryStore::handle`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::{glob, KvStore, SCAN_START};
use crate::error::{KvError, KvResult};

/// Number of logical databases, as in a default Redis server
pub const DATABASES: i64 = 16;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| now + d),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

type Database = HashMap<String, Entry>;

#[derive(Default)]
struct Shared {
    databases: RwLock<HashMap<i64, Database>>,
    failing: RwLock<HashSet<String>>,
    round_trips: AtomicU64,
    quit_reply: RwLock<Option<String>>,
}

/// In-memory [`KvStore`]
pub struct MemoryStore {
    shared: Arc<Shared>,
    db: AtomicI64,
    open: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty dataset with one closed connection to it
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            db: AtomicI64::new(0),
            open: false,
        }
    }

    /// Another closed connection to the same dataset
    pub fn handle(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            db: AtomicI64::new(0),
            open: false,
        }
    }

    /// Commands received across all connections to this dataset
    pub fn round_trips(&self) -> u64 {
        self.shared.round_trips.load(Ordering::SeqCst)
    }

    /// Make every later `command` (e.g. "MGET", "EXEC") fail with a store error
    pub fn fail_on(&self, command: &str) {
        self.shared.failing.write().insert(command.to_uppercase());
    }

    /// Answer later QUITs with `reply` instead of `OK`
    pub fn set_quit_reply(&self, reply: &str) {
        *self.shared.quit_reply.write() = Some(reply.to_string());
    }

    /// Undo all [`MemoryStore::fail_on`] calls
    pub fn clear_failures(&self) {
        self.shared.failing.write().clear();
    }

    /// Account for one command and check that it may run
    fn begin(&self, command: &str) -> KvResult<()> {
        if !self.open {
            return Err(KvError::NotConnected);
        }
        self.shared.round_trips.fetch_add(1, Ordering::SeqCst);
        if self.shared.failing.read().contains(command) {
            return Err(response_error("ERR", format!("injected failure for {}", command)));
        }
        Ok(())
    }

    /// Run `f` against the selected database with expired entries purged
    fn with_db<R>(&self, f: impl FnOnce(&mut Database, Instant) -> R) -> R {
        let now = Instant::now();
        let db = self.db.load(Ordering::SeqCst);
        let mut databases = self.shared.databases.write();
        let entries = databases.entry(db).or_default();
        entries.retain(|_, entry| !entry.is_expired(now));
        f(entries, now)
    }
}

fn response_error(code: &'static str, detail: impl Into<String>) -> KvError {
    KvError::Store(redis::RedisError::from((
        redis::ErrorKind::ResponseError,
        code,
        detail.into(),
    )))
}

fn check_set_ttl(ttl: Option<Duration>) -> KvResult<()> {
    match ttl {
        Some(d) if d.as_secs() == 0 => Err(response_error(
            "ERR",
            "invalid expire time in 'set' command",
        )),
        _ => Ok(()),
    }
}

/// Position of a key in SCAN order; independent of insertions and deletions
fn scan_position(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn connect(&mut self) -> KvResult<()> {
        self.open = true;
        self.db.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    async fn select(&self, db: i64) -> KvResult<()> {
        self.begin("SELECT")?;
        if !(0..DATABASES).contains(&db) {
            return Err(response_error("ERR", "DB index is out of range"));
        }
        self.db.store(db, Ordering::SeqCst);
        Ok(())
    }

    async fn quit(&mut self) -> KvResult<String> {
        self.begin("QUIT")?;
        self.open = false;
        let reply = self.shared.quit_reply.read().clone();
        Ok(reply.unwrap_or_else(|| "OK".to_string()))
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.begin("GET")?;
        Ok(self.with_db(|entries, _| entries.get(key).map(|e| e.value.clone())))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        self.begin("SET")?;
        check_set_ttl(ttl)?;
        self.with_db(|entries, now| {
            entries.insert(key.to_string(), Entry::new(value.to_string(), ttl, now));
        });
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Option<String>>> {
        self.begin("MGET")?;
        Ok(self.with_db(|entries, _| {
            keys.iter()
                .map(|key| entries.get(key).map(|e| e.value.clone()))
                .collect()
        }))
    }

    async fn del(&self, keys: &[String]) -> KvResult<u64> {
        self.begin("DEL")?;
        Ok(self.with_db(|entries, _| {
            keys.iter().filter(|key| entries.remove(key.as_str()).is_some()).count() as u64
        }))
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        self.begin("EXISTS")?;
        Ok(self.with_db(|entries, _| entries.contains_key(key)))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> KvResult<(u64, Vec<String>)> {
        self.begin("SCAN")?;
        if count == 0 {
            return Err(response_error("ERR", "syntax error"));
        }
        let matcher = glob::compile(pattern)
            .map_err(|e| response_error("ERR", format!("invalid pattern: {}", e)))?;

        let mut ordered: Vec<(u64, String)> = self.with_db(|entries, _| {
            entries
                .keys()
                .map(|key| (scan_position(key), key.clone()))
                .filter(|(position, _)| *position >= cursor)
                .collect()
        });
        ordered.sort_unstable();

        let next = ordered.get(count).map(|(position, _)| *position).unwrap_or(SCAN_START);
        let keys = ordered
            .into_iter()
            .take(count)
            .map(|(_, key)| key)
            .filter(|key| matcher.is_match(key))
            .collect();
        Ok((next, keys))
    }

    async fn set_many_atomic(&self, entries: &[(String, String)], ttl: Option<Duration>) -> KvResult<()> {
        self.begin("EXEC")?;
        check_set_ttl(ttl)?;
        self.with_db(|stored, now| {
            for (key, value) in entries {
                stored.insert(key.clone(), Entry::new(value.clone(), ttl, now));
            }
        });
        Ok(())
    }

    async fn expire_many_atomic(&self, keys: &[String], ttl: Duration) -> KvResult<()> {
        self.begin("EXEC")?;
        self.with_db(|stored, now| {
            for key in keys {
                // EXPIRE with a non-positive timeout deletes the key
                if ttl.as_secs() == 0 {
                    stored.remove(key);
                } else if let Some(entry) = stored.get_mut(key) {
                    entry.expires_at = Some(now + Duration::from_secs(ttl.as_secs()));
                }
            }
        });
        Ok(())
    }
}
