use std::sync::Arc;

use color_eyre::eyre;

use franchiso_config::{CacheBackend, Config};
use franchiso_service::{CacheStore, FranchiseService};
use franchiso_storage::{
	cache::{MemoryStore, RedisStore},
	elasticsearch::ElasticsearchStore,
};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<FranchiseService>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let index = ElasticsearchStore::new(&config.storage.elasticsearch)?;
		let cache: Arc<dyn CacheStore> = match config.storage.cache.backend {
			CacheBackend::Redis => {
				let url = config.storage.cache.redis_url.as_deref().ok_or_else(|| {
					eyre::eyre!("storage.cache.redis_url is required for the redis backend.")
				})?;

				Arc::new(RedisStore::connect(url).await?)
			},
			CacheBackend::Memory => Arc::new(MemoryStore::new()),
		};

		tracing::info!(
			index = %index.index,
			cache_backend = ?config.storage.cache.backend,
			semantic_fallback = config.search.semantic_fallback,
			"Search engine initialized."
		);

		Ok(Self::from_service(FranchiseService::new(config, Arc::new(index), cache)))
	}

	pub fn from_service(service: FranchiseService) -> Self {
		Self { service: Arc::new(service) }
	}
}
