use std::{
	collections::HashMap,
	sync::Mutex,
	time::{Duration, Instant},
};

use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{Error, Result};

/// Redis-backed string cache shared across service instances.
#[derive(Clone)]
pub struct RedisStore {
	conn: ConnectionManager,
}
impl RedisStore {
	pub async fn connect(url: &str) -> Result<Self> {
		let client = redis::Client::open(url)?;
		let conn = ConnectionManager::new(client).await?;

		Ok(Self { conn })
	}

	pub async fn get(&self, key: &str) -> Result<Option<String>> {
		let mut conn = self.conn.clone();

		Ok(conn.get::<_, Option<String>>(key).await?)
	}

	pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
		let seconds = ttl.as_secs();

		if seconds == 0 {
			return Err(Error::InvalidArgument("Cache TTL must be at least one second.".to_string()));
		}

		let mut conn = self.conn.clone();

		conn.set_ex::<_, _, ()>(key, value, seconds).await?;

		Ok(())
	}
}

const SWEEP_MIN_ENTRIES: usize = 1_024;

/// Process-local cache for single-instance and test setups.
///
/// Expired entries are dropped on read, and swept in bulk once the map doubles in size since
/// the last sweep, so keys that are never read again do not accumulate.
#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: Mutex<MemoryEntries>,
}

#[derive(Debug, Default)]
struct MemoryEntries {
	entries: HashMap<String, (String, Instant)>,
	sweep_at: usize,
}
impl MemoryEntries {
	fn sweep(&mut self, now: Instant) {
		self.entries.retain(|_, (_, expires_at)| *expires_at > now);
		self.sweep_at = (self.entries.len() * 2).max(SWEEP_MIN_ENTRIES);
	}
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<String> {
		let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
		let now = Instant::now();

		match inner.entries.get(key) {
			Some((value, expires_at)) if *expires_at > now => Some(value.clone()),
			Some(_) => {
				inner.entries.remove(key);

				None
			},
			None => None,
		}
	}

	pub fn set(&self, key: &str, value: &str, ttl: Duration) {
		let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
		let now = Instant::now();

		if inner.entries.len() >= inner.sweep_at.max(SWEEP_MIN_ENTRIES) {
			inner.sweep(now);
		}

		inner.entries.insert(key.to_string(), (value.to_string(), now + ttl));
	}

	pub fn len(&self) -> usize {
		self.inner.lock().unwrap_or_else(|err| err.into_inner()).entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn memory_store_returns_live_entries() {
		let store = MemoryStore::new();

		store.set("search-franchise:abc", "{\"data\":[]}", Duration::from_secs(60));

		assert_eq!(store.get("search-franchise:abc").as_deref(), Some("{\"data\":[]}"));
		assert_eq!(store.get("search-franchise:other"), None);
	}

	#[test]
	fn memory_store_expires_on_read() {
		let store = MemoryStore::new();

		store.set("k", "v", Duration::ZERO);

		assert_eq!(store.get("k"), None);
		assert!(store.is_empty());
	}

	#[test]
	fn memory_store_reclaims_expired_keys_that_are_never_read() {
		let store = MemoryStore::new();

		for i in 0..10_000 {
			store.set(&format!("search-franchise:{i}"), "{}", Duration::ZERO);
		}

		store.set("search-franchise:live", "{}", Duration::from_secs(60));

		assert!(store.len() <= SWEEP_MIN_ENTRIES, "len = {}", store.len());
		assert_eq!(store.get("search-franchise:live").as_deref(), Some("{}"));
	}

	#[test]
	fn memory_store_sweep_keeps_live_entries() {
		let store = MemoryStore::new();

		for i in 0..SWEEP_MIN_ENTRIES {
			store.set(&format!("live:{i}"), "v", Duration::from_secs(60));
		}

		store.set("extra", "v", Duration::from_secs(60));

		assert_eq!(store.len(), SWEEP_MIN_ENTRIES + 1);
		assert_eq!(store.get("live:0").as_deref(), Some("v"));
	}

	#[test]
	fn memory_store_overwrites() {
		let store = MemoryStore::new();

		store.set("k", "old", Duration::from_secs(60));
		store.set("k", "new", Duration::from_secs(60));

		assert_eq!(store.get("k").as_deref(), Some("new"));
		assert_eq!(store.len(), 1);
	}
}
