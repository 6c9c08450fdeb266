pub mod cache;
pub mod detail;
pub mod plan;
pub mod query;
pub mod request;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use plan::{Plan, PlanKind};
pub use request::{CanonicalQuery, ImageUpload, SearchRequest};
pub use search::{SearchOutcome, SearchResponse};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use franchiso_config::{
	Config, ImageVectorizerConfig, StorageProxyConfig, TextEmbeddingProviderConfig,
};
use franchiso_providers::{embedding, storage_proxy, vectorizer};
use franchiso_storage::{
	cache::{MemoryStore, RedisStore},
	elasticsearch::{ElasticsearchStore, SearchResponse as IndexResponse},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The listings index as the engine sees it: count probes, scored searches and point reads.
pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn count<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, franchiso_storage::Result<u64>>;

	fn search<'a>(
		&'a self,
		body: &'a Value,
	) -> BoxFuture<'a, franchiso_storage::Result<IndexResponse>>;

	fn get_source<'a>(
		&'a self,
		id: &'a str,
		excludes: &'a [&'a str],
	) -> BoxFuture<'a, franchiso_storage::Result<Option<Value>>>;
}

/// String key/value store with per-entry TTL.
pub trait CacheStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, franchiso_storage::Result<Option<String>>>;

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> BoxFuture<'a, franchiso_storage::Result<()>>;
}

pub trait TextEmbedder
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a TextEmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, franchiso_providers::Result<Vec<Vec<f32>>>>;
}

pub trait ImageVectorizer
where
	Self: Send + Sync,
{
	fn vectorize<'a>(
		&'a self,
		cfg: &'a ImageVectorizerConfig,
		file_path: &'a str,
	) -> BoxFuture<'a, franchiso_providers::Result<Vec<f32>>>;
}

/// Temporary file storage the vectorizer reads uploaded query images from.
pub trait UploadStore
where
	Self: Send + Sync,
{
	fn upload<'a>(
		&'a self,
		cfg: &'a StorageProxyConfig,
		file_name: &'a str,
		content_type: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, franchiso_providers::Result<String>>;

	fn delete<'a>(
		&'a self,
		cfg: &'a StorageProxyConfig,
		file_url: &'a str,
	) -> BoxFuture<'a, franchiso_providers::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn TextEmbedder>,
	pub vectorizer: Arc<dyn ImageVectorizer>,
	pub uploads: Arc<dyn UploadStore>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn TextEmbedder>,
		vectorizer: Arc<dyn ImageVectorizer>,
		uploads: Arc<dyn UploadStore>,
	) -> Self {
		Self { embedding, vectorizer, uploads }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), vectorizer: provider.clone(), uploads: provider }
	}
}

pub struct FranchiseService {
	pub cfg: Config,
	pub index: Arc<dyn SearchIndex>,
	pub cache: Arc<dyn CacheStore>,
	pub providers: Providers,
}
impl FranchiseService {
	pub fn new(cfg: Config, index: Arc<dyn SearchIndex>, cache: Arc<dyn CacheStore>) -> Self {
		Self { cfg, index, cache, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		index: Arc<dyn SearchIndex>,
		cache: Arc<dyn CacheStore>,
		providers: Providers,
	) -> Self {
		Self { cfg, index, cache, providers }
	}
}

struct DefaultProviders;

impl TextEmbedder for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a TextEmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, franchiso_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ImageVectorizer for DefaultProviders {
	fn vectorize<'a>(
		&'a self,
		cfg: &'a ImageVectorizerConfig,
		file_path: &'a str,
	) -> BoxFuture<'a, franchiso_providers::Result<Vec<f32>>> {
		Box::pin(vectorizer::vectorize(cfg, file_path))
	}
}

impl UploadStore for DefaultProviders {
	fn upload<'a>(
		&'a self,
		cfg: &'a StorageProxyConfig,
		file_name: &'a str,
		content_type: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, franchiso_providers::Result<String>> {
		Box::pin(storage_proxy::upload(cfg, file_name, content_type, bytes))
	}

	fn delete<'a>(
		&'a self,
		cfg: &'a StorageProxyConfig,
		file_url: &'a str,
	) -> BoxFuture<'a, franchiso_providers::Result<()>> {
		Box::pin(storage_proxy::delete(cfg, file_url))
	}
}

impl SearchIndex for ElasticsearchStore {
	fn count<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, franchiso_storage::Result<u64>> {
		Box::pin(ElasticsearchStore::count(self, body))
	}

	fn search<'a>(
		&'a self,
		body: &'a Value,
	) -> BoxFuture<'a, franchiso_storage::Result<IndexResponse>> {
		Box::pin(ElasticsearchStore::search(self, body))
	}

	fn get_source<'a>(
		&'a self,
		id: &'a str,
		excludes: &'a [&'a str],
	) -> BoxFuture<'a, franchiso_storage::Result<Option<Value>>> {
		Box::pin(ElasticsearchStore::get_source(self, id, excludes))
	}
}

impl CacheStore for RedisStore {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, franchiso_storage::Result<Option<String>>> {
		Box::pin(RedisStore::get(self, key))
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> BoxFuture<'a, franchiso_storage::Result<()>> {
		Box::pin(RedisStore::set(self, key, value, ttl))
	}
}

impl CacheStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, franchiso_storage::Result<Option<String>>> {
		let value = MemoryStore::get(self, key);

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> BoxFuture<'a, franchiso_storage::Result<()>> {
		MemoryStore::set(self, key, value, ttl);

		Box::pin(async { Ok(()) })
	}
}
