mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, CacheBackend, Config, Elasticsearch, IMAGE_VECTOR_DIM, ImageVectorizerConfig,
	KeywordMode, Providers, Search, SearchCache, Service, Storage, StorageProxyConfig,
	TextEmbeddingProviderConfig,
};

use std::{env, fs, path::Path};

pub const ENV_SEMANTIC_FALLBACK: &str = "FRANCHISO_SEMANTIC_FALLBACK";
pub const ENV_ELASTIC_URL: &str = "FRANCHISO_ELASTIC_URL";
pub const ENV_REDIS_URL: &str = "FRANCHISO_REDIS_URL";
pub const ENV_EMBEDDING_API_KEY: &str = "FRANCHISO_EMBEDDING_API_KEY";
pub const ENV_VECTORIZER_URL: &str = "FRANCHISO_VECTORIZER_URL";
pub const ENV_STORAGE_PROXY_URL: &str = "FRANCHISO_STORAGE_PROXY_URL";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	apply_env_overrides(&mut cfg, |key| env::var(key).ok())?;

	validate(&cfg)?;

	Ok(cfg)
}

/// Overlays collaborator URLs, credentials and the semantic fallback flag from the
/// environment. Empty values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let read = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|v| !v.is_empty());

	if let Some(raw) = read(ENV_SEMANTIC_FALLBACK) {
		cfg.search.semantic_fallback = parse_flag(&raw).ok_or_else(|| Error::Validation {
			message: format!("{ENV_SEMANTIC_FALLBACK} must be one of true, false, 1, or 0."),
		})?;
	}
	if let Some(url) = read(ENV_ELASTIC_URL) {
		cfg.storage.elasticsearch.url = url;
	}
	if let Some(url) = read(ENV_REDIS_URL) {
		cfg.storage.cache.redis_url = Some(url);
	}
	if let Some(key) = read(ENV_EMBEDDING_API_KEY) {
		cfg.providers.text_embedding.api_key = key;
	}
	if let Some(url) = read(ENV_VECTORIZER_URL) {
		cfg.providers.image_vectorizer.url = url;
	}
	if let Some(url) = read(ENV_STORAGE_PROXY_URL) {
		cfg.providers.storage_proxy.base_url = url;
	}

	Ok(())
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("storage.elasticsearch.url", &cfg.storage.elasticsearch.url),
		("storage.elasticsearch.index", &cfg.storage.elasticsearch.index),
		("providers.text_embedding.api_base", &cfg.providers.text_embedding.api_base),
		("providers.image_vectorizer.url", &cfg.providers.image_vectorizer.url),
		("providers.storage_proxy.base_url", &cfg.providers.storage_proxy.base_url),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.cache.backend == CacheBackend::Redis && cfg.storage.cache.redis_url.is_none() {
		return Err(Error::Validation {
			message: "storage.cache.redis_url is required when storage.cache.backend is redis."
				.to_string(),
		});
	}
	if cfg.providers.image_vectorizer.dimensions != IMAGE_VECTOR_DIM {
		return Err(Error::Validation {
			message: format!("providers.image_vectorizer.dimensions must be {IMAGE_VECTOR_DIM}."),
		});
	}
	if cfg.providers.text_embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.text_embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.search.semantic_fallback && cfg.providers.text_embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.text_embedding.api_key must be non-empty when search.semantic_fallback is true."
				.to_string(),
		});
	}

	for (label, value) in [
		("service.request_timeout_ms", cfg.service.request_timeout_ms),
		("storage.elasticsearch.timeout_ms", cfg.storage.elasticsearch.timeout_ms),
		("providers.text_embedding.timeout_ms", cfg.providers.text_embedding.timeout_ms),
		("providers.image_vectorizer.timeout_ms", cfg.providers.image_vectorizer.timeout_ms),
		("providers.storage_proxy.timeout_ms", cfg.providers.storage_proxy.timeout_ms),
		("search.cache.result_ttl_seconds", cfg.search.cache.result_ttl_seconds),
		("search.cache.embedding_ttl_seconds", cfg.search.cache.embedding_ttl_seconds),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.service.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "service.max_upload_bytes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let es = &mut cfg.storage.elasticsearch;

	if es.username.as_deref().map(|v| v.trim().is_empty()).unwrap_or(false) {
		es.username = None;
	}
	if es.password.as_deref().map(|v| v.trim().is_empty()).unwrap_or(false) {
		es.password = None;
	}
	if cfg.storage.cache.redis_url.as_deref().map(|v| v.trim().is_empty()).unwrap_or(false) {
		cfg.storage.cache.redis_url = None;
	}
}

fn parse_flag(raw: &str) -> Option<bool> {
	match raw.to_ascii_lowercase().as_str() {
		"true" | "1" => Some(true),
		"false" | "0" => Some(false),
		_ => None,
	}
}
