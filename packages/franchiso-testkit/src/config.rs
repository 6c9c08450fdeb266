use serde_json::Map;

use franchiso_config::{
	Cache, CacheBackend, Config, Elasticsearch, ImageVectorizerConfig, KeywordMode, Providers,
	Search, SearchCache, Service, Storage, StorageProxyConfig, TextEmbeddingProviderConfig,
};

/// Dimensions of the text embeddings the fakes hand out.
pub const TEST_TEXT_DIM: u32 = 4;

/// A valid config pointing every collaborator at `base_url`, with the memory cache backend.
pub fn test_config(base_url: &str) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			request_timeout_ms: 5_000,
			max_upload_bytes: 1024 * 1024,
		},
		storage: Storage {
			elasticsearch: Elasticsearch {
				url: base_url.to_string(),
				index: "franchises".to_string(),
				username: None,
				password: None,
				timeout_ms: 5_000,
			},
			cache: Cache { backend: CacheBackend::Memory, redis_url: None },
		},
		providers: Providers {
			text_embedding: TextEmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: base_url.to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "text-embedding-004".to_string(),
				dimensions: TEST_TEXT_DIM,
				timeout_ms: 5_000,
				default_headers: Map::new(),
			},
			image_vectorizer: ImageVectorizerConfig {
				url: format!("{base_url}/vectorize"),
				dimensions: franchiso_config::IMAGE_VECTOR_DIM,
				timeout_ms: 5_000,
			},
			storage_proxy: StorageProxyConfig { base_url: base_url.to_string(), timeout_ms: 5_000 },
		},
		search: Search {
			semantic_fallback: true,
			keyword_mode: KeywordMode::TermWildcard,
			cache: SearchCache::default(),
		},
	}
}
