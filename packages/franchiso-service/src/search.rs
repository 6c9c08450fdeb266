use std::time::Duration;

use serde::{Deserialize, Serialize};

use franchiso_storage::{elasticsearch::SearchResponse as IndexResponse, models::FranchiseListing};

use crate::{
	CanonicalQuery, Error, FranchiseService, Plan, PlanKind, Result, SearchRequest,
	cache::CacheLayer, query,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub total: i64,
	pub is_suggested_by_ai: bool,
	pub franchises: Vec<FranchiseListing>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
	pub plan: PlanKind,
	pub response: SearchResponse,
}

impl FranchiseService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		Ok(self.search_with_plan(req).await?.response)
	}

	/// Runs the whole pipeline under the configured request deadline.
	pub async fn search_with_plan(&self, req: SearchRequest) -> Result<SearchOutcome> {
		let deadline = Duration::from_millis(self.cfg.service.request_timeout_ms);

		match tokio::time::timeout(deadline, self.run_search(req.canonicalize())).await {
			Ok(outcome) => outcome,
			Err(_) => Err(Error::Unavailable { message: "Search deadline exceeded.".to_string() }),
		}
	}

	async fn run_search(&self, mut query: CanonicalQuery) -> Result<SearchOutcome> {
		let cache = CacheLayer::new(self.cache.as_ref(), &self.cfg.search.cache);
		let result_key = cache.result_key(&query);
		let image = query.image.take();
		let has_image = image.is_some();
		let plan = self.plan(&cache, &query, result_key.as_deref(), image).await?;
		let kind = plan.kind();

		tracing::info!(plan = kind.as_str(), has_image, "Retrieval plan selected.");

		let is_suggested_by_ai = plan.is_suggested_by_ai();
		let body = match plan {
			Plan::CacheHit(response) => return Ok(SearchOutcome { plan: kind, response }),
			plan => self.build_body(&query, plan),
		};
		let response = assemble(self.index.search(&body).await?, is_suggested_by_ai);

		if let Some(key) = result_key.as_deref() {
			cache.put_result(key, &response).await;
		}

		Ok(SearchOutcome { plan: kind, response })
	}

	fn build_body(&self, query: &CanonicalQuery, plan: Plan) -> serde_json::Value {
		let filter = query::filter_skeleton(query);
		let keyword = || query::keyword_clause(&query.search_query, self.cfg.search.keyword_mode);
		let (must, knn) = match plan {
			Plan::CacheHit(_) | Plan::FilterOnly => (None, Vec::new()),
			Plan::KeywordPrimary => (Some(keyword()), Vec::new()),
			Plan::SemanticFallback { vector } => (
				None,
				vec![query::knn_clause(
					query::TEXT_VECTOR_FIELD,
					&vector,
					&filter,
					query::TEXT_VECTOR_BOOST,
				)],
			),
			Plan::ImageHybrid { vector, keyword: with_keyword } =>
				(with_keyword.then(keyword), query::image_knn_clauses(&vector, &filter)),
		};

		query::search_body(query, filter, must, knn)
	}
}

/// Decodes hits in index order, then floats boosted listings to the front.
fn assemble(index: IndexResponse, is_suggested_by_ai: bool) -> SearchResponse {
	let mut franchises: Vec<FranchiseListing> = index
		.hits
		.hits
		.into_iter()
		.filter_map(|hit| match serde_json::from_value(hit.source) {
			Ok(listing) => Some(listing),
			Err(err) => {
				tracing::warn!(error = %err, hit_id = %hit.id, "Skipping undecodable hit.");

				None
			},
		})
		.collect();

	franchises.sort_by_key(|listing| !listing.is_boosted);

	SearchResponse { total: index.hits.total.value, is_suggested_by_ai, franchises }
}
