use std::time::Duration;

use serde::Serialize;

use franchiso_config::{SearchCache, TextEmbeddingProviderConfig};

use crate::{CacheStore, CanonicalQuery, SearchResponse};

pub const RESULT_NAMESPACE: &str = "search-franchise";
pub const EMBEDDING_NAMESPACE: &str = "search-embedding";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
	Result,
	Embedding,
}
impl CacheKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Result => "search_result",
			Self::Embedding => "text_embedding",
		}
	}

	fn namespace(self) -> &'static str {
		match self {
			Self::Result => RESULT_NAMESPACE,
			Self::Embedding => EMBEDDING_NAMESPACE,
		}
	}
}

/// `<namespace>:<md5 of the canonical JSON of payload>`.
pub fn fingerprint<T>(kind: CacheKind, payload: &T) -> serde_json::Result<String>
where
	T: Serialize + ?Sized,
{
	let raw = serde_json::to_vec(payload)?;

	Ok(format!("{}:{:x}", kind.namespace(), md5::compute(raw)))
}

pub fn result_key(query: &CanonicalQuery) -> serde_json::Result<String> {
	fingerprint(CacheKind::Result, query)
}

/// Vectors are only reusable for the model and size that produced them.
#[derive(Serialize)]
struct EmbeddingFingerprint<'a> {
	phrase: &'a str,
	model: &'a str,
	dimensions: u32,
}

pub fn embedding_key(phrase: &str, cfg: &TextEmbeddingProviderConfig) -> serde_json::Result<String> {
	fingerprint(
		CacheKind::Embedding,
		&EmbeddingFingerprint { phrase, model: &cfg.model, dimensions: cfg.dimensions },
	)
}

/// Both caches over one store. Every failure is logged and reads as a miss.
pub(crate) struct CacheLayer<'a> {
	store: &'a dyn CacheStore,
	cfg: &'a SearchCache,
}
impl<'a> CacheLayer<'a> {
	pub(crate) fn new(store: &'a dyn CacheStore, cfg: &'a SearchCache) -> Self {
		Self { store, cfg }
	}

	pub(crate) fn result_key(&self, query: &CanonicalQuery) -> Option<String> {
		if !self.cfg.enabled || query.image.is_some() {
			return None;
		}

		key_or_warn(CacheKind::Result, result_key(query))
	}

	pub(crate) async fn get_result(&self, key: &str) -> Option<SearchResponse> {
		let raw = self.read(CacheKind::Result, key).await?;

		match serde_json::from_str(&raw) {
			Ok(response) => Some(response),
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = CacheKind::Result.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload decode failed."
				);

				None
			},
		}
	}

	pub(crate) async fn put_result(&self, key: &str, response: &SearchResponse) {
		let ttl = Duration::from_secs(self.cfg.result_ttl_seconds);

		self.write(CacheKind::Result, key, serde_json::to_string(response), ttl).await;
	}

	pub(crate) fn embedding_key(
		&self,
		phrase: &str,
		embedding: &TextEmbeddingProviderConfig,
	) -> Option<String> {
		if !self.cfg.enabled {
			return None;
		}

		key_or_warn(CacheKind::Embedding, embedding_key(phrase, embedding))
	}

	/// A cached vector of any other length reads as a miss.
	pub(crate) async fn get_embedding(&self, key: &str, dimensions: usize) -> Option<Vec<f32>> {
		let raw = self.read(CacheKind::Embedding, key).await?;

		match serde_json::from_str::<Vec<f32>>(&raw) {
			Ok(vector) if vector.len() == dimensions => Some(vector),
			Ok(vector) => {
				tracing::warn!(
					cache_kind = CacheKind::Embedding.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					cached_dimensions = vector.len() as u64,
					expected_dimensions = dimensions as u64,
					"Cached embedding has the wrong dimension."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = CacheKind::Embedding.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload decode failed."
				);

				None
			},
		}
	}

	pub(crate) async fn put_embedding(&self, key: &str, vector: &[f32]) {
		let ttl = Duration::from_secs(self.cfg.embedding_ttl_seconds);

		self.write(CacheKind::Embedding, key, serde_json::to_string(vector), ttl).await;
	}

	async fn read(&self, kind: CacheKind, key: &str) -> Option<String> {
		match self.store.get(key).await {
			Ok(Some(raw)) => {
				tracing::info!(
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					hit = true,
					payload_size = raw.len() as u64,
					"Cache hit."
				);

				Some(raw)
			},
			Ok(None) => {
				tracing::info!(
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					hit = false,
					"Cache miss."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					"Cache read failed."
				);

				None
			},
		}
	}

	async fn write(
		&self,
		kind: CacheKind,
		key: &str,
		payload: serde_json::Result<String>,
		ttl: Duration,
	) {
		let payload = match payload {
			Ok(payload) => payload,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload encode failed."
				);

				return;
			},
		};

		match self.store.set(key, &payload, ttl).await {
			Ok(()) => tracing::info!(
				cache_kind = kind.as_str(),
				cache_key_prefix = cache_key_prefix(key),
				payload_size = payload.len() as u64,
				ttl_seconds = ttl.as_secs(),
				"Cache stored."
			),
			Err(err) => tracing::warn!(
				error = %err,
				cache_kind = kind.as_str(),
				cache_key_prefix = cache_key_prefix(key),
				"Cache write failed."
			),
		}
	}
}

fn key_or_warn(kind: CacheKind, key: serde_json::Result<String>) -> Option<String> {
	match key {
		Ok(key) => Some(key),
		Err(err) => {
			tracing::warn!(error = %err, cache_kind = kind.as_str(), "Cache key build failed.");

			None
		},
	}
}

/// First twelve digest characters, skipping the namespace.
fn cache_key_prefix(key: &str) -> &str {
	let digest = key.rsplit_once(':').map(|(_, digest)| digest).unwrap_or(key);
	let len = digest.len().min(12);

	&digest[..len]
}
