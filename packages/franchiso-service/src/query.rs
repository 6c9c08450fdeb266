//! Request bodies for the listings index.
//!
//! Every body this module emits carries the same sort and projection, so a cached
//! response and a live one order their hits identically.

use serde_json::{Map, Value, json};

use franchiso_config::KeywordMode;
use franchiso_storage::models::VECTOR_FIELDS;

use crate::CanonicalQuery;

pub const KNN_K: u32 = 10;
pub const KNN_NUM_CANDIDATES: u32 = 50;
pub const KEYWORD_BOOST: f64 = 0.5;
pub const TEXT_VECTOR_BOOST: f64 = 0.8;
pub const IMAGE_VECTOR_BOOST: f64 = 0.2;
pub const KNN_MIN_SCORE: f64 = 0.1;

pub const TEXT_VECTOR_FIELD: &str = "text_vector";
pub const LOGO_VECTOR_FIELD: &str = "logo.vector";
pub const AD_PHOTO_VECTOR_FIELD: &str = "ad_photos.vector";

const BRAND_FIELD: &str = "brand";
const CATEGORY_FIELD: &str = "category.category_id.keyword";

/// Non-scoring `bool.filter` conjunction of the structured predicates.
pub fn filter_skeleton(query: &CanonicalQuery) -> Value {
	let mut filters = Vec::new();

	if let Some(category) = query.category.as_deref() {
		filters.push(json!({ "term": { CATEGORY_FIELD: category } }));
	}

	let ranges = [
		("investment", query.min_investment, query.max_investment),
		("monthly_revenue", query.min_monthly_revenue, None),
		("roi", query.min_roi, query.max_roi),
		("branch_count", query.min_branch_count, query.max_branch_count),
		("year_founded", query.min_year_founded, query.max_year_founded),
	];

	for (field, gte, lte) in ranges {
		if let Some(range) = range_clause(field, gte, lte) {
			filters.push(range);
		}
	}

	json!({ "bool": { "filter": filters } })
}

fn range_clause(field: &str, gte: Option<i64>, lte: Option<i64>) -> Option<Value> {
	if gte.is_none() && lte.is_none() {
		return None;
	}

	let mut bounds = Map::new();

	if let Some(gte) = gte {
		bounds.insert("gte".to_string(), json!(gte));
	}
	if let Some(lte) = lte {
		bounds.insert("lte".to_string(), json!(lte));
	}

	Some(json!({ "range": { field: bounds } }))
}

/// Disjunction over `brand`: exact (or fuzzy) term and `*phrase*` wildcard, one must match.
pub fn keyword_clause(phrase: &str, mode: KeywordMode) -> Value {
	let lowered = phrase.to_lowercase();
	let primary = match mode {
		KeywordMode::TermWildcard => json!({
			"term": { BRAND_FIELD: { "value": lowered, "boost": KEYWORD_BOOST } }
		}),
		KeywordMode::FuzzyMatch => json!({
			"match": { BRAND_FIELD: { "query": phrase, "fuzziness": "AUTO", "boost": KEYWORD_BOOST } }
		}),
	};
	let wildcard = json!({
		"wildcard": {
			BRAND_FIELD: { "value": format!("*{}*", escape_wildcard(&lowered)), "boost": KEYWORD_BOOST }
		}
	});

	json!({ "bool": { "should": [primary, wildcard], "minimum_should_match": 1 } })
}

fn escape_wildcard(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.chars() {
		if matches!(c, '*' | '?' | '\\') {
			out.push('\\');
		}

		out.push(c);
	}

	out
}

/// Count body measuring lexical presence across the whole corpus, filters ignored.
pub fn probe_body(keyword: &Value) -> Value {
	json!({ "query": { "bool": { "must": [keyword] } } })
}

pub fn knn_clause(field: &str, vector: &[f32], filter: &Value, boost: f64) -> Value {
	json!({
		"field": field,
		"query_vector": vector,
		"k": KNN_K,
		"num_candidates": KNN_NUM_CANDIDATES,
		"filter": filter,
		"boost": boost,
	})
}

pub fn image_knn_clauses(vector: &[f32], filter: &Value) -> Vec<Value> {
	vec![
		knn_clause(LOGO_VECTOR_FIELD, vector, filter, IMAGE_VECTOR_BOOST),
		knn_clause(AD_PHOTO_VECTOR_FIELD, vector, filter, IMAGE_VECTOR_BOOST),
	]
}

/// The full search envelope.
pub fn search_body(
	query: &CanonicalQuery,
	filter: Value,
	must: Option<Value>,
	knn: Vec<Value>,
) -> Value {
	let mut bool_query = Map::new();

	bool_query.insert("filter".to_string(), filter);

	if let Some(must) = must {
		bool_query.insert("must".to_string(), must);
	}

	let mut body = Map::new();

	body.insert("query".to_string(), json!({ "bool": bool_query }));
	body.insert("from".to_string(), json!(query.offset()));
	body.insert("size".to_string(), json!(query.limit));
	body.insert(
		"sort".to_string(),
		json!([
			{ "is_boosted": { "order": "desc" } },
			{ "_score": { "order": "desc" } },
		]),
	);
	body.insert("_source".to_string(), json!({ "excludes": VECTOR_FIELDS }));

	if !knn.is_empty() {
		body.insert("knn".to_string(), Value::Array(knn));
		body.insert("min_score".to_string(), json!(KNN_MIN_SCORE));
	}

	Value::Object(body)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SearchRequest;

	fn canonical(req: SearchRequest) -> CanonicalQuery {
		req.canonicalize()
	}

	#[test]
	fn filter_skeleton_carries_category_and_inclusive_ranges() {
		let query = canonical(SearchRequest {
			category: Some("cat-a".to_string()),
			min_investment: Some(100_000),
			max_investment: Some(500_000),
			min_monthly_revenue: Some(20_000),
			max_year_founded: Some(2020),
			..Default::default()
		});
		let skeleton = filter_skeleton(&query);

		assert_eq!(
			skeleton,
			json!({ "bool": { "filter": [
				{ "term": { "category.category_id.keyword": "cat-a" } },
				{ "range": { "investment": { "gte": 100000, "lte": 500000 } } },
				{ "range": { "monthly_revenue": { "gte": 20000 } } },
				{ "range": { "year_founded": { "lte": 2020 } } },
			] } })
		);
	}

	#[test]
	fn empty_filters_still_produce_a_bool() {
		let skeleton = filter_skeleton(&canonical(SearchRequest::default()));

		assert_eq!(skeleton, json!({ "bool": { "filter": [] } }));
	}

	#[test]
	fn keyword_clause_lowercases_and_escapes() {
		let clause = keyword_clause("Pizza*Hut?", KeywordMode::TermWildcard);
		let should = &clause["bool"]["should"];

		assert_eq!(should[0]["term"]["brand"]["value"], json!("pizza*hut?"));
		assert_eq!(should[1]["wildcard"]["brand"]["value"], json!("*pizza\\*hut\\?*"));
		assert_eq!(should[0]["term"]["brand"]["boost"], should[1]["wildcard"]["brand"]["boost"]);
		assert_eq!(clause["bool"]["minimum_should_match"], json!(1));
	}

	#[test]
	fn fuzzy_mode_swaps_only_the_primary_arm() {
		let clause = keyword_clause("Burgr", KeywordMode::FuzzyMatch);
		let should = &clause["bool"]["should"];

		assert_eq!(should[0]["match"]["brand"]["fuzziness"], json!("AUTO"));
		assert_eq!(should[0]["match"]["brand"]["query"], json!("Burgr"));
		assert_eq!(should[1]["wildcard"]["brand"]["value"], json!("*burgr*"));
	}

	#[test]
	fn probe_ignores_filters() {
		let keyword = keyword_clause("burger", KeywordMode::TermWildcard);
		let body = probe_body(&keyword);

		assert_eq!(body, json!({ "query": { "bool": { "must": [keyword] } } }));
	}

	#[test]
	fn envelope_without_knn_has_no_min_score() {
		let query = canonical(SearchRequest { page: Some(2), limit: Some(5), ..Default::default() });
		let body = search_body(&query, filter_skeleton(&query), None, Vec::new());

		assert_eq!(body["from"], json!(5));
		assert_eq!(body["size"], json!(5));
		assert!(body.get("knn").is_none());
		assert!(body.get("min_score").is_none());
		assert!(body["query"]["bool"].get("must").is_none());
		assert_eq!(
			body["_source"]["excludes"],
			json!(["text_vector", "logo.vector", "ad_photos.vector"])
		);
		assert_eq!(body["sort"][0], json!({ "is_boosted": { "order": "desc" } }));
		assert_eq!(body["sort"][1], json!({ "_score": { "order": "desc" } }));
	}

	#[test]
	fn knn_clauses_embed_the_filter_and_set_min_score() {
		let query = canonical(SearchRequest { category: Some("cat-a".to_string()), ..Default::default() });
		let filter = filter_skeleton(&query);
		let knn = image_knn_clauses(&[0.5; 4], &filter);
		let body = search_body(&query, filter.clone(), None, knn);

		assert_eq!(body["min_score"], json!(0.1));
		assert_eq!(body["knn"][0]["field"], json!("logo.vector"));
		assert_eq!(body["knn"][1]["field"], json!("ad_photos.vector"));

		for clause in body["knn"].as_array().expect("knn array") {
			assert_eq!(clause["filter"], filter);
			assert_eq!(clause["k"], json!(10));
			assert_eq!(clause["num_candidates"], json!(50));
			assert_eq!(clause["boost"], json!(0.2));
		}
	}
}
