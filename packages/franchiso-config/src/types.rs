use serde::Deserialize;
use serde_json::{Map, Value};

pub const IMAGE_VECTOR_DIM: u32 = 512;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
	#[serde(default = "default_max_upload_bytes")]
	pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub elasticsearch: Elasticsearch,
	pub cache: Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Elasticsearch {
	pub url: String,
	#[serde(default = "default_index")]
	pub index: String,
	pub username: Option<String>,
	pub password: Option<String>,
	#[serde(default = "default_index_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
	Redis,
	Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	pub backend: CacheBackend,
	pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub text_embedding: TextEmbeddingProviderConfig,
	pub image_vectorizer: ImageVectorizerConfig,
	pub storage_proxy: StorageProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextEmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	#[serde(default = "default_collaborator_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageVectorizerConfig {
	pub url: String,
	#[serde(default = "default_image_dimensions")]
	pub dimensions: u32,
	#[serde(default = "default_collaborator_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageProxyConfig {
	pub base_url: String,
	#[serde(default = "default_storage_proxy_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
	/// Exact lowercased `term` plus `*phrase*` wildcard on `brand`.
	#[default]
	TermWildcard,
	/// Fuzzy `match` plus `*phrase*` wildcard on `brand`.
	FuzzyMatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub semantic_fallback: bool,
	#[serde(default)]
	pub keyword_mode: KeywordMode,
	#[serde(default)]
	pub cache: SearchCache,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCache {
	pub enabled: bool,
	pub result_ttl_seconds: u64,
	pub embedding_ttl_seconds: u64,
}
impl Default for SearchCache {
	fn default() -> Self {
		Self { enabled: true, result_ttl_seconds: 600, embedding_ttl_seconds: 86_400 }
	}
}

fn default_request_timeout_ms() -> u64 {
	120_000
}

fn default_max_upload_bytes() -> usize {
	10 * 1024 * 1024
}

fn default_index() -> String {
	"franchises".to_string()
}

fn default_index_timeout_ms() -> u64 {
	10_000
}

fn default_collaborator_timeout_ms() -> u64 {
	60_000
}

fn default_storage_proxy_timeout_ms() -> u64 {
	30_000
}

fn default_image_dimensions() -> u32 {
	IMAGE_VECTOR_DIM
}
