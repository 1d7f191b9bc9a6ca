//! Typed key-value facade for tidepool
//!
//! [`KvFacade`] wraps a [`KvStore`] (Redis in production, [`MemoryStore`]
//! for tests and embedded use) with:
//! - typed accessors for text, numbers, big integers and [`Value`] trees
//! - case-insensitive key normalization (see [`Key`])
//! - pipelined batch set/get, batch TTL updates
//! - pattern deletion driven by the store's SCAN cursor
//!
//! Object values go through [`tidepool_codec`], which keeps big integers
//! exact across JSON.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use tidepool_kv::{KvConfig, KvFacade};
//!
//! # async fn example() -> Result<(), tidepool_kv::KvError> {
//! let mut kv = KvFacade::redis(KvConfig::new("redis://localhost:6379").db_index(2))?;
//! kv.connect().await?;
//!
//! kv.set_text("Session:42", "alice", Some(Duration::from_secs(60))).await?;
//! assert_eq!(kv.get_text("session:42").await?, Some("alice".to_string()));
//!
//! kv.delete_by_pattern("session:*").await?;
//! kv.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod key;
pub mod store;

pub use config::KvConfig;
pub use error::{KvError, KvResult};
pub use facade::KvFacade;
pub use key::{Key, KeyCase};
pub use store::memory::MemoryStore;
pub use store::redis::RedisStore;
pub use store::{KvStore, SCAN_START};

pub use tidepool_codec::{BigInt, CodecError, Value};
