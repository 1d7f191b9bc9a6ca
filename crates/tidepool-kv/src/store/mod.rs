//! Store seam
//!
//! [`KvStore`] is the command set the facade needs from a key-value store.
//! Every method maps to one round trip; the `*_atomic` methods send their
//! commands as a single MULTI/EXEC pipeline.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::KvResult;

mod glob;
pub mod memory;
pub mod redis;

/// Cursor value that starts a SCAN and that the store returns when done
pub const SCAN_START: u64 = 0;

/// Trait for key-value store connections
///
/// Command methods take `&self` so independent calls can be in flight at
/// once; they fail with [`crate::KvError::NotConnected`] while the store is
/// closed. Failures reported by the store come back as
/// [`crate::KvError::Store`].
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Open the connection
    async fn connect(&mut self) -> KvResult<()>;

    /// Whether a connection is currently open
    fn is_open(&self) -> bool;

    /// Drop the connection without a shutdown handshake
    fn close(&mut self);

    /// Select the logical database for this connection
    async fn select(&self, db: i64) -> KvResult<()>;

    /// Send QUIT and close; returns the store's status reply
    async fn quit(&mut self) -> KvResult<String>;

    /// GET
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// SET, with `EX <seconds>` when a TTL is given
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()>;

    /// MGET; one slot per requested key, in order
    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Option<String>>>;

    /// DEL; returns how many keys existed
    async fn del(&self, keys: &[String]) -> KvResult<u64>;

    /// EXISTS for a single key
    async fn exists(&self, key: &str) -> KvResult<bool>;

    /// SCAN `cursor` MATCH `pattern` COUNT `count`; returns the next cursor
    /// ([`SCAN_START`] when the iteration is complete) and this page's keys
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> KvResult<(u64, Vec<String>)>;

    /// One SET per entry, all with the same TTL, in one atomic pipeline
    async fn set_many_atomic(&self, entries: &[(String, String)], ttl: Option<Duration>) -> KvResult<()>;

    /// EXISTS followed by EXPIRE for every key, in one atomic pipeline
    async fn expire_many_atomic(&self, keys: &[String], ttl: Duration) -> KvResult<()>;
}
