use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Value, json};

use franchiso_config::{
	Config, ImageVectorizerConfig, StorageProxyConfig, TextEmbeddingProviderConfig,
};
use franchiso_service::{
	BoxFuture, CacheStore, Error, FranchiseService, ImageUpload, ImageVectorizer, PlanKind,
	Providers, SearchIndex, SearchRequest, TextEmbedder, UploadStore,
};
use franchiso_storage::{cache::MemoryStore, elasticsearch::SearchResponse as IndexResponse};
use franchiso_testkit::{Corpus, listing_doc};

#[derive(Default)]
struct FakeIndex {
	corpus: Corpus,
	counts: Mutex<Vec<Value>>,
	searches: Mutex<Vec<Value>>,
	fail_count: bool,
	fail_search: bool,
	delay: Option<Duration>,
}
impl FakeIndex {
	fn counts(&self) -> Vec<Value> {
		self.counts.lock().expect("lock").clone()
	}

	fn searches(&self) -> Vec<Value> {
		self.searches.lock().expect("lock").clone()
	}

	fn requests(&self) -> usize {
		self.counts().len() + self.searches().len()
	}
}
impl SearchIndex for FakeIndex {
	fn count<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, franchiso_storage::Result<u64>> {
		self.counts.lock().expect("lock").push(body.clone());

		Box::pin(async move {
			if self.fail_count {
				return Err(franchiso_storage::Error::Status { status: 503, body: String::new() });
			}

			Ok(self.corpus.count(body))
		})
	}

	fn search<'a>(
		&'a self,
		body: &'a Value,
	) -> BoxFuture<'a, franchiso_storage::Result<IndexResponse>> {
		self.searches.lock().expect("lock").push(body.clone());

		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail_search {
				return Err(franchiso_storage::Error::Status {
					status: 500,
					body: "shard failure".to_string(),
				});
			}

			Ok(serde_json::from_value(self.corpus.search(body))?)
		})
	}

	fn get_source<'a>(
		&'a self,
		id: &'a str,
		excludes: &'a [&'a str],
	) -> BoxFuture<'a, franchiso_storage::Result<Option<Value>>> {
		let excludes: Vec<String> = excludes.iter().map(|field| field.to_string()).collect();
		let source = self.corpus.get(id, &excludes);

		Box::pin(async move { Ok(source) })
	}
}

#[derive(Default)]
struct SpyCache {
	inner: MemoryStore,
	writes: Mutex<Vec<String>>,
}
impl SpyCache {
	fn writes(&self) -> Vec<String> {
		self.writes.lock().expect("lock").clone()
	}
}
impl CacheStore for SpyCache {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, franchiso_storage::Result<Option<String>>> {
		let value = self.inner.get(key);

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> BoxFuture<'a, franchiso_storage::Result<()>> {
		self.writes.lock().expect("lock").push(key.to_string());
		self.inner.set(key, value, ttl);

		Box::pin(async { Ok(()) })
	}
}

struct BrokenCache;
impl CacheStore for BrokenCache {
	fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, franchiso_storage::Result<Option<String>>> {
		Box::pin(async {
			Err(franchiso_storage::Error::InvalidResponse { message: "cache down".to_string() })
		})
	}

	fn set<'a>(
		&'a self,
		_key: &'a str,
		_value: &'a str,
		_ttl: Duration,
	) -> BoxFuture<'a, franchiso_storage::Result<()>> {
		Box::pin(async {
			Err(franchiso_storage::Error::InvalidResponse { message: "cache down".to_string() })
		})
	}
}

struct SpyEmbedder {
	vector: Vec<f32>,
	fail: bool,
	calls: AtomicUsize,
}
impl SpyEmbedder {
	fn new(vector: Vec<f32>) -> Self {
		Self { vector, fail: false, calls: AtomicUsize::new(0) }
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TextEmbedder for SpyEmbedder {
	fn embed<'a>(
		&'a self,
		_cfg: &'a TextEmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, franchiso_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result = if self.fail {
			Err(franchiso_providers::Error::Status {
				target: "text embedding",
				status: 503,
				body: String::new(),
			})
		} else {
			Ok(vec![self.vector.clone(); texts.len()])
		};

		Box::pin(async move { result })
	}
}

struct SpyVectorizer {
	vector: Vec<f32>,
	fail: bool,
	delay: Option<Duration>,
	paths: Mutex<Vec<String>>,
}
impl SpyVectorizer {
	fn new(vector: Vec<f32>) -> Self {
		Self { vector, fail: false, delay: None, paths: Mutex::new(Vec::new()) }
	}

	fn count(&self) -> usize {
		self.paths.lock().expect("lock").len()
	}
}
impl ImageVectorizer for SpyVectorizer {
	fn vectorize<'a>(
		&'a self,
		_cfg: &'a ImageVectorizerConfig,
		file_path: &'a str,
	) -> BoxFuture<'a, franchiso_providers::Result<Vec<f32>>> {
		self.paths.lock().expect("lock").push(file_path.to_string());

		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail {
				return Err(franchiso_providers::Error::Status {
					target: "image vectorizer",
					status: 500,
					body: "model crashed".to_string(),
				});
			}

			Ok(self.vector.clone())
		})
	}
}

#[derive(Default)]
struct SpyUploads {
	uploads: Mutex<Vec<(String, String, usize)>>,
	deletes: Mutex<Vec<String>>,
}
impl SpyUploads {
	fn uploads(&self) -> Vec<(String, String, usize)> {
		self.uploads.lock().expect("lock").clone()
	}

	fn deletes(&self) -> Vec<String> {
		self.deletes.lock().expect("lock").clone()
	}
}
impl UploadStore for SpyUploads {
	fn upload<'a>(
		&'a self,
		_cfg: &'a StorageProxyConfig,
		file_name: &'a str,
		content_type: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, franchiso_providers::Result<String>> {
		self.uploads.lock().expect("lock").push((
			file_name.to_string(),
			content_type.to_string(),
			bytes.len(),
		));

		let url = format!("/file/{file_name}");

		Box::pin(async move { Ok(url) })
	}

	fn delete<'a>(
		&'a self,
		_cfg: &'a StorageProxyConfig,
		file_url: &'a str,
	) -> BoxFuture<'a, franchiso_providers::Result<()>> {
		self.deletes.lock().expect("lock").push(file_url.to_string());

		Box::pin(async { Ok(()) })
	}
}

struct Harness {
	service: FranchiseService,
	index: Arc<FakeIndex>,
	cache: Arc<SpyCache>,
	embedder: Arc<SpyEmbedder>,
	vectorizer: Arc<SpyVectorizer>,
	uploads: Arc<SpyUploads>,
}

struct Setup {
	cfg: Config,
	index: FakeIndex,
	embedder: SpyEmbedder,
	vectorizer: SpyVectorizer,
}
impl Setup {
	fn new(docs: Vec<Value>) -> Self {
		Self {
			cfg: franchiso_testkit::test_config("http://127.0.0.1:9"),
			index: FakeIndex { corpus: Corpus::new(docs), ..Default::default() },
			embedder: SpyEmbedder::new(text_vector()),
			vectorizer: SpyVectorizer::new(image_vector()),
		}
	}

	fn build(self) -> Harness {
		let index = Arc::new(self.index);
		let cache = Arc::new(SpyCache::default());
		let embedder = Arc::new(self.embedder);
		let vectorizer = Arc::new(self.vectorizer);
		let uploads = Arc::new(SpyUploads::default());
		let service = FranchiseService::with_providers(
			self.cfg,
			index.clone(),
			cache.clone(),
			Providers::new(embedder.clone(), vectorizer.clone(), uploads.clone()),
		);

		Harness { service, index, cache, embedder, vectorizer, uploads }
	}
}

fn text_vector() -> Vec<f32> {
	vec![1.0, 0.0, 0.0, 0.0]
}

fn image_vector() -> Vec<f32> {
	vec![0.5; 512]
}

fn phrase(text: &str) -> SearchRequest {
	SearchRequest { search_query: Some(text.to_string()), ..Default::default() }
}

fn png_upload() -> ImageUpload {
	ImageUpload {
		file_name: Some("logo.png".to_string()),
		content_type: Some("image/png".to_string()),
		bytes: vec![0x89, b'P', b'N', b'G'],
	}
}

fn burger_king() -> Value {
	listing_doc("bk-1", "Burger King", "Flame grilled burgers", false)
}

fn cafe_with_text_vector() -> Value {
	let mut doc = listing_doc("cafe-1", "MyCafe", "fried chicken bucket meal", false);

	doc["text_vector"] = json!(text_vector());

	doc
}

fn listing_with_logo_vector(id: &str, brand: &str) -> Value {
	let mut doc = listing_doc(id, brand, "Known logo", false);

	doc["logo"]["vector"] = json!(image_vector());

	doc
}

fn s4_request() -> SearchRequest {
	SearchRequest {
		search_query: Some("Burger".to_string()),
		category: Some("cat-a".to_string()),
		min_investment: Some(100_000),
		max_investment: Some(500_000),
		page: Some(2),
		limit: Some(5),
		..Default::default()
	}
}

#[tokio::test]
async fn keyword_hit_is_not_suggested_by_ai() {
	let h = Setup::new(vec![burger_king()]).build();
	let outcome = h.service.search_with_plan(phrase("Burger")).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::KeywordPrimary);
	assert_eq!(outcome.response.total, 1);
	assert_eq!(outcome.response.franchises.len(), 1);
	assert!(!outcome.response.is_suggested_by_ai);
	assert_eq!(h.index.counts().len(), 1);
	assert!(h.index.searches()[0]["query"]["bool"].get("must").is_some());
	assert_eq!(h.embedder.count(), 0);
}

#[tokio::test]
async fn zero_probe_with_fallback_runs_text_knn() {
	let h = Setup::new(vec![cafe_with_text_vector()]).build();
	let outcome = h.service.search_with_plan(phrase("chicken")).await.expect("Search failed.");
	let body = &h.index.searches()[0];

	assert_eq!(outcome.plan, PlanKind::SemanticFallback);
	assert_eq!(outcome.response.total, 1);
	assert!(outcome.response.is_suggested_by_ai);
	assert_eq!(h.embedder.count(), 1);
	assert_eq!(body["knn"][0]["field"], json!("text_vector"));
	assert_eq!(body["knn"][0]["boost"], json!(0.8));
	assert_eq!(body["knn"][0]["filter"], body["query"]["bool"]["filter"]);
	assert_eq!(body["min_score"], json!(0.1));
	assert!(body["query"]["bool"].get("must").is_none());
}

#[tokio::test]
async fn phrase_embedding_is_reused_from_cache() {
	let h = Setup::new(vec![cafe_with_text_vector()]).build();
	let first = SearchRequest { page: Some(1), ..phrase("chicken") };
	let second = SearchRequest { page: Some(2), ..phrase("chicken") };

	h.service.search(first).await.expect("Search failed.");
	h.service.search(second).await.expect("Search failed.");

	assert_eq!(h.embedder.count(), 1);
	assert!(h.cache.writes().iter().any(|key| key.starts_with("search-embedding:")));
}

#[tokio::test]
async fn zero_probe_without_fallback_stays_keyword_and_empty() {
	let mut setup = Setup::new(vec![cafe_with_text_vector()]);

	setup.cfg.search.semantic_fallback = false;

	let h = setup.build();
	let outcome = h.service.search_with_plan(phrase("chicken")).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::KeywordPrimary);
	assert_eq!(outcome.response.total, 0);
	assert!(!outcome.response.is_suggested_by_ai);
	assert_eq!(h.embedder.count(), 0);
}

#[tokio::test]
async fn embedding_failure_downgrades_to_keyword() {
	let mut setup = Setup::new(vec![cafe_with_text_vector()]);

	setup.embedder.fail = true;

	let h = setup.build();
	let outcome = h.service.search_with_plan(phrase("chicken")).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::KeywordPrimary);
	assert!(!outcome.response.is_suggested_by_ai);
	assert!(h.index.searches()[0].get("knn").is_none());
}

#[tokio::test]
async fn unreachable_embedder_downgrades_to_keyword() {
	let index =
		Arc::new(FakeIndex { corpus: Corpus::new(vec![cafe_with_text_vector()]), ..Default::default() });
	let cache = Arc::new(SpyCache::default());
	let service = FranchiseService::with_providers(
		franchiso_testkit::test_config("http://127.0.0.1:1"),
		index.clone(),
		cache.clone(),
		Providers::new(
			Providers::default().embedding,
			Arc::new(SpyVectorizer::new(image_vector())),
			Arc::new(SpyUploads::default()),
		),
	);
	let outcome = service.search_with_plan(phrase("chicken")).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::KeywordPrimary);
	assert!(!outcome.response.is_suggested_by_ai);
	assert!(index.searches()[0].get("knn").is_none());
	assert!(!cache.writes().iter().any(|key| key.starts_with("search-embedding:")));
}

#[tokio::test]
async fn mis_sized_embedding_downgrades_to_keyword() {
	let mut setup = Setup::new(vec![cafe_with_text_vector()]);

	setup.embedder.vector = vec![1.0, 0.0];

	let h = setup.build();
	let outcome = h.service.search_with_plan(phrase("chicken")).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::KeywordPrimary);
	assert!(h.index.searches()[0].get("knn").is_none());
	assert!(!h.cache.writes().iter().any(|key| key.starts_with("search-embedding:")));
}

#[tokio::test]
async fn stale_cached_embedding_is_recomputed() {
	let h = Setup::new(vec![cafe_with_text_vector()]).build();
	let key = franchiso_service::cache::embedding_key(
		"chicken",
		&h.service.cfg.providers.text_embedding,
	)
	.expect("key");

	h.cache.inner.set(&key, "[1.0,0.0]", Duration::from_secs(60));

	let outcome = h.service.search_with_plan(phrase("chicken")).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::SemanticFallback);
	assert_eq!(h.embedder.count(), 1);
	assert_eq!(h.index.searches()[0]["knn"][0]["query_vector"], json!(text_vector()));
}

#[tokio::test]
async fn boosted_listing_leads_equal_matches() {
	let h = Setup::new(vec![
		listing_doc("pizza-plain", "Pizza Hut", "Pan pizza", false),
		listing_doc("pizza-boosted", "Pizza Hut", "Pan pizza", true),
	])
	.build();
	let response = h.service.search(phrase("pizza")).await.expect("Search failed.");

	assert_eq!(response.franchises[0].id, "pizza-boosted");
	assert!(response.franchises[0].is_boosted);
	assert!(!response.franchises[1].is_boosted);
}

#[tokio::test]
async fn filters_and_pagination_reach_the_index() {
	let h = Setup::new(vec![burger_king()]).build();

	h.service.search(s4_request()).await.expect("Search failed.");

	let body = &h.index.searches()[0];
	let filters = body["query"]["bool"]["filter"]["bool"]["filter"].as_array().expect("filters");

	assert_eq!(body["from"], json!(5));
	assert_eq!(body["size"], json!(5));
	assert!(filters.contains(&json!({ "term": { "category.category_id.keyword": "cat-a" } })));
	assert!(filters.contains(&json!({ "range": { "investment": { "gte": 100000, "lte": 500000 } } })));
	assert_eq!(
		body["sort"],
		json!([{ "is_boosted": { "order": "desc" } }, { "_score": { "order": "desc" } }])
	);
	assert!(h.index.counts()[0].to_string().find("cat-a").is_none());
}

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
	let h = Setup::new(vec![burger_king()]).build();
	let first = h.service.search_with_plan(s4_request()).await.expect("Search failed.");
	let requests_after_first = h.index.requests();
	let second = h.service.search_with_plan(s4_request()).await.expect("Search failed.");

	assert_eq!(second.plan, PlanKind::CacheHit);
	assert_eq!(h.index.requests(), requests_after_first);
	assert_eq!(
		serde_json::to_vec(&first.response).expect("encode"),
		serde_json::to_vec(&second.response).expect("encode")
	);
}

#[tokio::test]
async fn cached_semantic_result_keeps_ai_flag() {
	let h = Setup::new(vec![cafe_with_text_vector()]).build();

	h.service.search(phrase("chicken")).await.expect("Search failed.");

	let cached = h.service.search_with_plan(phrase("chicken")).await.expect("Search failed.");

	assert_eq!(cached.plan, PlanKind::CacheHit);
	assert!(cached.response.is_suggested_by_ai);
}

#[tokio::test]
async fn image_query_uploads_vectorizes_and_deletes() {
	let h = Setup::new(vec![listing_with_logo_vector("logo-1", "Known Brand")]).build();
	let req = SearchRequest::default().with_image(png_upload());
	let outcome = h.service.search_with_plan(req).await.expect("Search failed.");
	let uploads = h.uploads.uploads();
	let body = &h.index.searches()[0];
	let fields: Vec<&Value> = body["knn"].as_array().expect("knn").iter().map(|c| &c["field"]).collect();

	assert_eq!(outcome.plan, PlanKind::ImageHybrid);
	assert!(outcome.response.is_suggested_by_ai);
	assert_eq!(outcome.response.total, 1);
	assert_eq!(h.vectorizer.count(), 1);
	assert_eq!(uploads.len(), 1);
	assert!(uploads[0].0.starts_with("search-") && uploads[0].0.ends_with(".png"));
	assert_eq!(uploads[0].1, "image/png");
	assert_eq!(h.uploads.deletes(), vec![format!("/file/{}", uploads[0].0)]);
	assert_eq!(fields, vec![&json!("logo.vector"), &json!("ad_photos.vector")]);
	assert!(body["query"]["bool"].get("must").is_none());
	assert!(h.index.counts().is_empty());
	assert!(h.cache.writes().is_empty());
}

#[tokio::test]
async fn repeated_image_query_vectorizes_again() {
	let h = Setup::new(vec![listing_with_logo_vector("logo-1", "Known Brand")]).build();

	for _ in 0..2 {
		let req = SearchRequest::default().with_image(png_upload());

		h.service.search(req).await.expect("Search failed.");
	}

	assert_eq!(h.vectorizer.count(), 2);
	assert_eq!(h.uploads.deletes().len(), 2);
	assert!(h.cache.writes().is_empty());
}

#[tokio::test]
async fn image_with_phrase_keeps_keyword_clause() {
	let h = Setup::new(vec![listing_with_logo_vector("logo-1", "Known Brand")]).build();
	let req = phrase("known").with_image(png_upload());
	let outcome = h.service.search_with_plan(req).await.expect("Search failed.");
	let body = &h.index.searches()[0];

	assert_eq!(outcome.plan, PlanKind::ImageHybrid);
	assert!(body["query"]["bool"].get("must").is_some());
	assert_eq!(body["knn"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn vectorizer_failure_surfaces_and_still_deletes() {
	let mut setup = Setup::new(vec![listing_with_logo_vector("logo-1", "Known Brand")]);

	setup.vectorizer.fail = true;

	let h = setup.build();
	let err = h
		.service
		.search(SearchRequest::default().with_image(png_upload()))
		.await
		.expect_err("Expected failure.");

	assert!(matches!(err, Error::BackendFailure { .. }));
	assert_eq!(h.uploads.deletes().len(), 1);
	assert!(h.index.searches().is_empty());
}

#[tokio::test]
async fn cancelled_image_query_cleans_up_upload() {
	let mut setup = Setup::new(vec![listing_with_logo_vector("logo-1", "Known Brand")]);

	setup.cfg.service.request_timeout_ms = 50;
	setup.vectorizer.delay = Some(Duration::from_secs(10));

	let h = setup.build();
	let err = h
		.service
		.search(SearchRequest::default().with_image(png_upload()))
		.await
		.expect_err("Expected deadline.");

	assert!(matches!(err, Error::Unavailable { .. }));

	for _ in 0..50 {
		if !h.uploads.deletes().is_empty() {
			break;
		}

		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	assert_eq!(h.uploads.deletes().len(), 1);
}

#[tokio::test]
async fn responses_never_expose_vectors() {
	let h = Setup::new(vec![cafe_with_text_vector(), listing_with_logo_vector("logo-1", "Known")])
		.build();
	let semantic = h.service.search(phrase("chicken")).await.expect("Search failed.");
	let image =
		h.service.search(SearchRequest::default().with_image(png_upload())).await.expect("Search failed.");

	for response in [semantic, image] {
		let rendered = serde_json::to_string(&response).expect("encode");

		assert!(!response.franchises.is_empty());
		assert!(!rendered.contains("vector"), "{rendered}");
	}
}

#[tokio::test]
async fn empty_phrase_is_filter_only_without_probe() {
	let h = Setup::new(vec![burger_king(), cafe_with_text_vector()]).build();
	let outcome = h.service.search_with_plan(SearchRequest::default()).await.expect("Search failed.");

	assert_eq!(outcome.plan, PlanKind::FilterOnly);
	assert_eq!(outcome.response.total, 2);
	assert!(!outcome.response.is_suggested_by_ai);
	assert!(h.index.counts().is_empty());
	assert!(h.index.searches()[0].get("min_score").is_none());
}

#[tokio::test]
async fn probe_failure_is_backend_failure() {
	let mut setup = Setup::new(vec![burger_king()]);

	setup.index.fail_count = true;

	let h = setup.build();
	let err = h.service.search(phrase("Burger")).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::BackendFailure { .. }));
	assert!(h.index.searches().is_empty());
	assert_eq!(h.embedder.count(), 0);
}

#[tokio::test]
async fn index_failure_is_backend_failure_and_not_cached() {
	let mut setup = Setup::new(vec![burger_king()]);

	setup.index.fail_search = true;

	let h = setup.build();
	let err = h.service.search(phrase("Burger")).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::BackendFailure { .. }));
	assert!(h.cache.writes().is_empty());
}

#[tokio::test]
async fn slow_index_hits_the_request_deadline() {
	let mut setup = Setup::new(vec![burger_king()]);

	setup.cfg.service.request_timeout_ms = 50;
	setup.index.delay = Some(Duration::from_secs(5));

	let err = setup.build().service.search(SearchRequest::default()).await.expect_err("Expected deadline.");

	assert!(matches!(err, Error::Unavailable { .. }));
}

#[tokio::test]
async fn broken_cache_reads_as_miss() {
	let index = Arc::new(FakeIndex { corpus: Corpus::new(vec![burger_king()]), ..Default::default() });
	let service = FranchiseService::with_providers(
		franchiso_testkit::test_config("http://127.0.0.1:9"),
		index.clone(),
		Arc::new(BrokenCache),
		Providers::new(
			Arc::new(SpyEmbedder::new(text_vector())),
			Arc::new(SpyVectorizer::new(image_vector())),
			Arc::new(SpyUploads::default()),
		),
	);

	for _ in 0..2 {
		let response = service.search(phrase("Burger")).await.expect("Search failed.");

		assert_eq!(response.total, 1);
	}

	assert_eq!(index.searches().len(), 2);
}

#[tokio::test]
async fn disabled_cache_is_never_written() {
	let mut setup = Setup::new(vec![cafe_with_text_vector()]);

	setup.cfg.search.cache.enabled = false;

	let h = setup.build();

	h.service.search(phrase("chicken")).await.expect("Search failed.");
	h.service.search(phrase("chicken")).await.expect("Search failed.");

	assert!(h.cache.writes().is_empty());
	assert_eq!(h.embedder.count(), 2);
}

#[tokio::test]
async fn detail_returns_listing_without_vectors() {
	let h = Setup::new(vec![listing_with_logo_vector("logo-1", "Known Brand")]).build();
	let listing = h.service.get_franchise("logo-1").await.expect("Lookup failed.");

	assert_eq!(listing.brand, "Known Brand");
	assert!(!serde_json::to_string(&listing).expect("encode").contains("vector"));
	assert!(h.cache.writes().is_empty());
}

#[tokio::test]
async fn detail_of_unknown_or_blank_id_fails() {
	let h = Setup::new(vec![burger_king()]).build();
	let missing = h.service.get_franchise("nope").await.expect_err("Expected not found.");
	let blank = h.service.get_franchise("  ").await.expect_err("Expected invalid request.");

	assert!(matches!(missing, Error::NotFound { .. }));
	assert!(matches!(blank, Error::InvalidRequest { .. }));
}
