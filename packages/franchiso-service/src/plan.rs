use std::sync::Arc;

use franchiso_config::StorageProxyConfig;

use crate::{
	CanonicalQuery, Error, FranchiseService, ImageUpload, Result, SearchResponse, UploadStore,
	cache::CacheLayer, query,
};

/// The closed set of retrieval strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
	CacheHit(SearchResponse),
	FilterOnly,
	KeywordPrimary,
	SemanticFallback { vector: Vec<f32> },
	ImageHybrid { vector: Vec<f32>, keyword: bool },
}
impl Plan {
	pub fn kind(&self) -> PlanKind {
		match self {
			Self::CacheHit(_) => PlanKind::CacheHit,
			Self::FilterOnly => PlanKind::FilterOnly,
			Self::KeywordPrimary => PlanKind::KeywordPrimary,
			Self::SemanticFallback { .. } => PlanKind::SemanticFallback,
			Self::ImageHybrid { .. } => PlanKind::ImageHybrid,
		}
	}

	pub fn is_suggested_by_ai(&self) -> bool {
		match self {
			Self::CacheHit(response) => response.is_suggested_by_ai,
			Self::SemanticFallback { .. } | Self::ImageHybrid { .. } => true,
			Self::FilterOnly | Self::KeywordPrimary => false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
	CacheHit,
	FilterOnly,
	KeywordPrimary,
	SemanticFallback,
	ImageHybrid,
}
impl PlanKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::CacheHit => "cache_hit",
			Self::FilterOnly => "filter_only",
			Self::KeywordPrimary => "keyword_primary",
			Self::SemanticFallback => "semantic_fallback",
			Self::ImageHybrid => "image_hybrid",
		}
	}
}

impl FranchiseService {
	/// Chooses a plan. `image` has already been split off `query`.
	pub(crate) async fn plan(
		&self,
		cache: &CacheLayer<'_>,
		query: &CanonicalQuery,
		result_key: Option<&str>,
		image: Option<ImageUpload>,
	) -> Result<Plan> {
		if let Some(key) = result_key
			&& let Some(cached) = cache.get_result(key).await
		{
			return Ok(Plan::CacheHit(cached));
		}

		if let Some(image) = image {
			let vector = self.embed_image(image).await?;

			return Ok(Plan::ImageHybrid { vector, keyword: query.has_phrase() });
		}

		if !query.has_phrase() {
			return Ok(Plan::FilterOnly);
		}

		let keyword = query::keyword_clause(&query.search_query, self.cfg.search.keyword_mode);
		let probe_count = self.index.count(&query::probe_body(&keyword)).await.map_err(|err| {
			Error::BackendFailure { message: format!("Keyword probe failed: {err}") }
		})?;

		tracing::info!(probe_count, "Keyword probe finished.");

		if probe_count > 0 || !self.cfg.search.semantic_fallback {
			return Ok(Plan::KeywordPrimary);
		}

		match self.embed_phrase(cache, &query.search_query).await {
			Some(vector) => Ok(Plan::SemanticFallback { vector }),
			None => Ok(Plan::KeywordPrimary),
		}
	}

	/// Phrase embedding for the semantic fallback. Any failure degrades to `None`.
	async fn embed_phrase(&self, cache: &CacheLayer<'_>, phrase: &str) -> Option<Vec<f32>> {
		let cfg = &self.cfg.providers.text_embedding;
		let dimensions = cfg.dimensions as usize;
		let key = cache.embedding_key(phrase, cfg);

		if let Some(key) = key.as_deref()
			&& let Some(vector) = cache.get_embedding(key, dimensions).await
		{
			return Some(vector);
		}

		let texts = [phrase.to_string()];
		let vector = match self.providers.embedding.embed(cfg, &texts).await {
			Ok(mut vectors) => vectors.pop(),
			Err(err) => {
				tracing::warn!(
					error = %err,
					provider_id = %cfg.provider_id,
					unavailable = err.is_unavailable(),
					"Text embedding failed. Staying on the keyword plan."
				);

				return None;
			},
		};
		let Some(vector) = vector.filter(|vector| vector.len() == dimensions) else {
			tracing::warn!(
				provider_id = %cfg.provider_id,
				expected_dimensions = dimensions as u64,
				"Text embedding came back empty or mis-sized. Staying on the keyword plan."
			);

			return None;
		};

		if let Some(key) = key.as_deref() {
			cache.put_embedding(key, &vector).await;
		}

		Some(vector)
	}

	/// Upload, vectorize, delete. The upload is removed even if this future is dropped.
	async fn embed_image(&self, image: ImageUpload) -> Result<Vec<f32>> {
		let file_name = format!("search-{}.{}", uuid::Uuid::new_v4(), image.extension());
		let content_type = image
			.content_type
			.clone()
			.unwrap_or_else(|| "application/octet-stream".to_string());
		let proxy_cfg = &self.cfg.providers.storage_proxy;
		let file_url = self
			.providers
			.uploads
			.upload(proxy_cfg, &file_name, &content_type, image.bytes)
			.await?;
		let guard = UploadGuard::new(self.providers.uploads.clone(), proxy_cfg.clone(), file_url);
		let vectorized = self
			.providers
			.vectorizer
			.vectorize(&self.cfg.providers.image_vectorizer, guard.file_url())
			.await;

		guard.finish().await;

		Ok(vectorized?)
	}
}

/// Owns a temporary upload until it has been deleted.
struct UploadGuard {
	store: Arc<dyn UploadStore>,
	cfg: StorageProxyConfig,
	file_url: Option<String>,
}
impl UploadGuard {
	fn new(store: Arc<dyn UploadStore>, cfg: StorageProxyConfig, file_url: String) -> Self {
		Self { store, cfg, file_url: Some(file_url) }
	}

	fn file_url(&self) -> &str {
		self.file_url.as_deref().unwrap_or_default()
	}

	async fn finish(mut self) {
		if let Some(file_url) = self.file_url.as_deref() {
			delete_upload(self.store.as_ref(), &self.cfg, file_url).await;
		}

		self.file_url = None;
	}
}
impl Drop for UploadGuard {
	fn drop(&mut self) {
		let Some(file_url) = self.file_url.take() else {
			return;
		};
		let Ok(handle) = tokio::runtime::Handle::try_current() else {
			tracing::warn!(file_url = %file_url, "No runtime to clean up temporary upload.");

			return;
		};
		let store = self.store.clone();
		let cfg = self.cfg.clone();

		handle.spawn(async move {
			delete_upload(store.as_ref(), &cfg, &file_url).await;
		});
	}
}

async fn delete_upload(store: &dyn UploadStore, cfg: &StorageProxyConfig, file_url: &str) {
	match store.delete(cfg, file_url).await {
		Ok(()) => tracing::debug!(file_url, "Temporary upload deleted."),
		Err(err) => tracing::warn!(error = %err, file_url, "Temporary upload cleanup failed."),
	}
}
