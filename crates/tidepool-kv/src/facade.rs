//! Typed key-value facade
//!
//! All key arguments accept anything that converts into a [`Key`]; plain
//! strings follow [`KvConfig::ignore_key_case`]. TTLs are whole seconds,
//! anything below a second is truncated. Store failures are returned as they
//! come from the store, with no retry.

use num_bigint::BigInt;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::time::Duration;
use tidepool_codec::{decode, encode, Value};
use tracing::{debug, info, warn};

use crate::config::KvConfig;
use crate::error::{KvError, KvResult};
use crate::key::Key;
use crate::store::redis::RedisStore;
use crate::store::{KvStore, SCAN_START};

/// Typed accessors and batch operations over a [`KvStore`]
pub struct KvFacade<S: KvStore = RedisStore> {
    store: S,
    config: KvConfig,
}

impl KvFacade<RedisStore> {
    /// Facade over a Redis store for `config.url`; call [`KvFacade::connect`] next
    pub fn redis(config: KvConfig) -> KvResult<Self> {
        let store = RedisStore::open(&config.url)?;
        Ok(Self::with_store(store, config))
    }
}

impl<S: KvStore> KvFacade<S> {
    /// Facade over any store; call [`KvFacade::connect`] next
    pub fn with_store(store: S, config: KvConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_open()
    }

    /// Open the connection and select the configured database.
    ///
    /// If the SELECT fails the connection is closed again before the error
    /// is returned.
    pub async fn connect(&mut self) -> KvResult<()> {
        self.store.connect().await?;

        if let Err(e) = self.store.select(self.config.db_index).await {
            self.store.close();
            return Err(KvError::Connection(format!(
                "Failed to select database {}: {}",
                self.config.db_index, e
            )));
        }

        info!(db = self.config.db_index, "Connected to key-value store");
        Ok(())
    }

    /// Send QUIT if a connection is open; a reply other than `OK` is an error
    pub async fn disconnect(&mut self) -> KvResult<()> {
        if !self.store.is_open() {
            return Ok(());
        }

        let status = self.store.quit().await?;
        if status != "OK" {
            warn!(status = %status, "Unexpected reply to QUIT");
            return Err(KvError::Connection(format!(
                "Disconnect failed: store replied {}",
                status
            )));
        }

        info!("Disconnected from key-value store");
        Ok(())
    }

    fn normalize(&self, key: impl Into<Key>) -> String {
        key.into().resolve(self.config.ignore_key_case)
    }

    fn normalize_all<I>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        keys.into_iter().map(|k| self.normalize(k)).collect()
    }

    // ---- text ----

    /// Store text; without a TTL the key never expires
    pub async fn set_text(&self, key: impl Into<Key>, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let key = self.normalize(key);
        debug!(key = %key, ttl = ?ttl, "SET");
        self.store.set(&key, value, ttl).await
    }

    pub async fn get_text(&self, key: impl Into<Key>) -> KvResult<Option<String>> {
        let key = self.normalize(key);
        debug!(key = %key, "GET");
        self.store.get(&key).await
    }

    // ---- numbers ----

    /// Store a number as its decimal text
    pub async fn set_number(&self, key: impl Into<Key>, value: f64, ttl: Option<Duration>) -> KvResult<()> {
        self.set_text(key, &value.to_string(), ttl).await
    }

    /// `None` if the key is missing or its text is not a finite number
    pub async fn get_number(&self, key: impl Into<Key>) -> KvResult<Option<f64>> {
        let text = self.get_text(key).await?;
        Ok(text.as_deref().and_then(parse_finite))
    }

    // ---- big integers ----

    /// Store a big integer as plain decimal text (no `n` marker)
    pub async fn set_big_int(&self, key: impl Into<Key>, value: &BigInt, ttl: Option<Duration>) -> KvResult<()> {
        self.set_text(key, &value.to_string(), ttl).await
    }

    /// `None` if the key is missing or empty; fails if the text is not an integer
    pub async fn get_big_int(&self, key: impl Into<Key>) -> KvResult<Option<BigInt>> {
        match self.get_text(key).await? {
            Some(text) => parse_big_int(&text),
            None => Ok(None),
        }
    }

    // ---- objects ----

    /// Store a value tree in the codec's wire form
    pub async fn set_object(&self, key: impl Into<Key>, value: &Value, ttl: Option<Duration>) -> KvResult<()> {
        let text = encode(value)?;
        self.set_text(key, &text, ttl).await
    }

    /// `None` if the key is missing or empty; fails on malformed text
    pub async fn get_object(&self, key: impl Into<Key>) -> KvResult<Option<Value>> {
        let text = self.get_text(key).await?;
        decode_optional(text)
    }

    // ---- batches ----

    /// Delete keys in one DEL; returns how many existed. Empty input is a no-op.
    pub async fn delete_keys<I>(&self, keys: I) -> KvResult<u64>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let keys = self.normalize_all(keys);
        if keys.is_empty() {
            return Ok(0);
        }

        debug!(count = keys.len(), "DEL");
        self.store.del(&keys).await
    }

    /// Set every entry in one atomic pipeline with a shared TTL.
    /// Empty input is a no-op.
    pub async fn batch_set_text<I, K, V>(&self, entries: I, ttl: Option<Duration>) -> KvResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: AsRef<str>,
    {
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| (self.normalize(k), v.as_ref().to_string()))
            .collect();
        self.set_entries(entries, ttl).await
    }

    /// Fetch keys with one MGET, keyed by their normalized names. Missing
    /// keys and empty stored text both map to `None`.
    /// Empty input returns an empty map without touching the store.
    pub async fn batch_get_text<I>(&self, keys: I) -> KvResult<BTreeMap<String, Option<String>>>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let keys = self.normalize_all(keys);
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }

        debug!(count = keys.len(), "MGET");
        let values = self.store.mget(&keys).await?;
        Ok(keys
            .into_iter()
            .zip(values)
            .map(|(key, value)| (key, value.filter(|v| !v.is_empty())))
            .collect())
    }

    /// [`KvFacade::batch_set_text`] with each value encoded by the codec
    pub async fn batch_set_object<I, K, V>(&self, entries: I, ttl: Option<Duration>) -> KvResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Borrow<Value>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| Ok::<_, KvError>((self.normalize(k), encode(v.borrow())?)))
            .collect::<KvResult<Vec<_>>>()?;
        self.set_entries(entries, ttl).await
    }

    /// [`KvFacade::batch_get_text`] with each value decoded by the codec
    pub async fn batch_get_object<I>(&self, keys: I) -> KvResult<BTreeMap<String, Option<Value>>>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        self.batch_get_text(keys)
            .await?
            .into_iter()
            .map(|(key, text)| Ok::<_, KvError>((key, decode_optional(text)?)))
            .collect()
    }

    async fn set_entries(&self, entries: Vec<(String, String)>, ttl: Option<Duration>) -> KvResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        debug!(count = entries.len(), ttl = ?ttl, "MULTI SET");
        self.store.set_many_atomic(&entries, ttl).await
    }

    /// Whether the key currently exists (not expired, not deleted)
    pub async fn exists(&self, key: impl Into<Key>) -> KvResult<bool> {
        let key = self.normalize(key);
        debug!(key = %key, "EXISTS");
        self.store.exists(&key).await
    }

    /// Delete every key matching a glob pattern, one SCAN page at a time,
    /// using [`KvConfig::scan_page_size`]. The pattern is used as given.
    pub async fn delete_by_pattern(&self, pattern: &str) -> KvResult<u64> {
        self.delete_by_pattern_paged(pattern, self.config.scan_page_size).await
    }

    /// [`KvFacade::delete_by_pattern`] with an explicit COUNT hint
    pub async fn delete_by_pattern_paged(&self, pattern: &str, page_size: usize) -> KvResult<u64> {
        let mut cursor = SCAN_START;
        let mut removed = 0;
        let mut pages = 0;

        loop {
            let (next, keys) = self.store.scan(cursor, pattern, page_size).await?;
            pages += 1;
            if !keys.is_empty() {
                removed += self.store.del(&keys).await?;
            }
            cursor = next;
            if cursor == SCAN_START {
                break;
            }
        }

        debug!(pattern = %pattern, pages, removed, "Deleted keys by pattern");
        Ok(removed)
    }

    /// Set a TTL on every key in one atomic pipeline.
    ///
    /// Each key gets an EXISTS ahead of its EXPIRE. The EXISTS result is not
    /// consulted; EXPIRE on a missing key is already a no-op in the store.
    pub async fn batch_update_ttl<I>(&self, keys: I, ttl: Duration) -> KvResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let keys = self.normalize_all(keys);
        if keys.is_empty() {
            return Ok(());
        }

        debug!(count = keys.len(), ttl = ?ttl, "MULTI EXISTS/EXPIRE");
        self.store.expire_many_atomic(&keys, ttl).await
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_big_int(text: &str) -> KvResult<Option<BigInt>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KvError::InvalidInteger(text.to_string()));
    }
    trimmed
        .parse::<BigInt>()
        .map(Some)
        .map_err(|_| KvError::InvalidInteger(text.to_string()))
}

fn decode_optional(text: Option<String>) -> KvResult<Option<Value>> {
    match text {
        Some(text) if !text.is_empty() => Ok(Some(decode(&text)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_finite() {
        assert_eq!(parse_finite("42"), Some(42.0));
        assert_eq!(parse_finite(" -1.5 "), Some(-1.5));
        assert_eq!(parse_finite("1e3"), Some(1000.0));
        assert_eq!(parse_finite(""), None);
        assert_eq!(parse_finite("abc"), None);
        assert_eq!(parse_finite("inf"), None);
        assert_eq!(parse_finite("NaN"), None);
    }

    #[test]
    fn test_parse_big_int() {
        let n = parse_big_int("123456789012345678901234567890").unwrap().unwrap();
        assert_eq!(n.to_string(), "123456789012345678901234567890");
        assert_eq!(parse_big_int("-17").unwrap(), Some(BigInt::from(-17)));
        assert_eq!(parse_big_int("  ").unwrap(), None);
        assert!(matches!(parse_big_int("12.5"), Err(KvError::InvalidInteger(_))));
        assert!(matches!(parse_big_int("12n"), Err(KvError::InvalidInteger(_))));
        assert!(matches!(parse_big_int("1_000"), Err(KvError::InvalidInteger(_))));
        assert!(matches!(parse_big_int("-"), Err(KvError::InvalidInteger(_))));
        assert_eq!(parse_big_int("+8").unwrap(), Some(BigInt::from(8)));
    }

    #[test]
    fn test_decode_optional() {
        assert_eq!(decode_optional(None).unwrap(), None);
        assert_eq!(decode_optional(Some(String::new())).unwrap(), None);
        assert_eq!(decode_optional(Some("\"5n\"".to_string())).unwrap(), Some(Value::BigInt(5.into())));
        assert!(matches!(decode_optional(Some("{".to_string())), Err(KvError::Codec(_))));
    }
}
