//! A tiny in-memory evaluator for the subset of the Elasticsearch query DSL the discovery
//! engine emits: `bool`, `term`, `wildcard`, `match`, `range`, `match_all`, top-level `knn`,
//! `sort`, `from`/`size`, `min_score` and `_source.excludes`.
//!
//! Text fields are tokenized on non-alphanumeric boundaries and lowercased, which mirrors the
//! standard analyzer closely enough for `brand` lookups. Fields suffixed with `.keyword` are
//! compared verbatim.

use std::cmp::Ordering;

use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Default)]
pub struct Corpus {
	docs: Vec<Value>,
}
impl Corpus {
	pub fn new(docs: Vec<Value>) -> Self {
		Self { docs }
	}

	pub fn count(&self, body: &Value) -> u64 {
		let query = body.get("query");

		self.docs.iter().filter(|doc| query.map(|q| eval_query(q, doc).is_some()).unwrap_or(true)).count()
			as u64
	}

	pub fn search(&self, body: &Value) -> Value {
		let query = body.get("query");
		let knn_clauses = match body.get("knn") {
			Some(Value::Array(items)) => items.clone(),
			Some(item @ Value::Object(_)) => vec![item.clone()],
			_ => Vec::new(),
		};
		let mut scores: Vec<Option<f64>> = self
			.docs
			.iter()
			.map(|doc| match query {
				Some(q) => eval_query(q, doc),
				None if knn_clauses.is_empty() => Some(1.0),
				None => None,
			})
			.collect();

		for clause in &knn_clauses {
			for (index, contribution) in self.knn_contributions(clause) {
				let slot = &mut scores[index];

				*slot = Some(slot.unwrap_or(0.0) + contribution);
			}
		}

		let min_score = body.get("min_score").and_then(Value::as_f64);
		let mut matched: Vec<(usize, f64)> = scores
			.into_iter()
			.enumerate()
			.filter_map(|(index, score)| score.map(|s| (index, s)))
			.filter(|(_, score)| min_score.map(|min| *score >= min).unwrap_or(true))
			.collect();

		if let Some(Value::Array(sort)) = body.get("sort") {
			matched.sort_by(|a, b| compare_by_sort(sort, (&self.docs[a.0], a.1), (&self.docs[b.0], b.1)));
		} else {
			matched.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
		}

		let total = matched.len();
		let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
		let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
		let excludes = source_excludes(body);
		let hits: Vec<Value> = matched
			.iter()
			.skip(from)
			.take(size)
			.map(|(index, score)| {
				let doc = &self.docs[*index];

				json!({
					"_index": "franchises",
					"_id": doc.get("id").cloned().unwrap_or(Value::Null),
					"_score": score,
					"_source": strip_paths(doc, &excludes),
				})
			})
			.collect();
		let max_score = matched.iter().map(|(_, s)| *s).fold(None, |acc: Option<f64>, s| {
			Some(acc.map(|a| a.max(s)).unwrap_or(s))
		});

		json!({
			"took": 1,
			"timed_out": false,
			"hits": {
				"total": { "value": total, "relation": "eq" },
				"max_score": max_score,
				"hits": hits,
			}
		})
	}

	pub fn get(&self, id: &str, excludes: &[String]) -> Option<Value> {
		self.docs
			.iter()
			.find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
			.map(|doc| strip_paths(doc, excludes))
	}

	fn knn_contributions(&self, clause: &Value) -> Vec<(usize, f64)> {
		let Some(field) = clause.get("field").and_then(Value::as_str) else {
			return Vec::new();
		};
		let query_vector = as_vector(clause.get("query_vector"));
		let k = clause.get("k").and_then(Value::as_u64).unwrap_or(10) as usize;
		let boost = clause.get("boost").and_then(Value::as_f64).unwrap_or(1.0);
		let filter = clause.get("filter");
		let mut candidates: Vec<(usize, f64)> = self
			.docs
			.iter()
			.enumerate()
			.filter(|(_, doc)| filter.map(|f| eval_filter(f, doc)).unwrap_or(true))
			.filter_map(|(index, doc)| {
				vectors_at(doc, field)
					.iter()
					.map(|candidate| cosine_score(&query_vector, candidate))
					.fold(None, |acc: Option<f64>, s| Some(acc.map(|a| a.max(s)).unwrap_or(s)))
					.map(|score| (index, score))
			})
			.collect();

		candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
		candidates.truncate(k);

		candidates.into_iter().map(|(index, score)| (index, score * boost)).collect()
	}
}

fn eval_filter(filter: &Value, doc: &Value) -> bool {
	match filter {
		Value::Array(items) => items.iter().all(|item| eval_query(item, doc).is_some()),
		other => eval_query(other, doc).is_some(),
	}
}

fn eval_query(query: &Value, doc: &Value) -> Option<f64> {
	let obj = query.as_object()?;
	let (kind, body) = obj.iter().next()?;

	match kind.as_str() {
		"match_all" => Some(1.0),
		"bool" => eval_bool(body, doc),
		"term" => eval_leaf(body, |field, spec| {
			let expected = spec.get("value").unwrap_or(spec);

			term_matches(doc, field, expected)
		}),
		"wildcard" => eval_leaf(body, |field, spec| {
			let pattern = spec.get("value").or_else(|| spec.get("wildcard")).unwrap_or(spec);

			pattern.as_str().map(|p| wildcard_matches(doc, field, p)).unwrap_or(false)
		}),
		"match" => eval_leaf(body, |field, spec| {
			let text = spec.get("query").unwrap_or(spec);

			text.as_str()
				.map(|t| tokenize(t).iter().any(|token| field_tokens(doc, field).contains(token)))
				.unwrap_or(false)
		}),
		"range" => eval_leaf(body, |field, spec| range_matches(doc, field, spec)).map(|_| 1.0),
		_ => None,
	}
}

fn eval_leaf<F>(body: &Value, matches: F) -> Option<f64>
where
	F: Fn(&str, &Value) -> bool,
{
	let (field, spec) = body.as_object()?.iter().next()?;

	if !matches(field, spec) {
		return None;
	}

	Some(spec.get("boost").and_then(Value::as_f64).unwrap_or(1.0))
}

fn eval_bool(body: &Value, doc: &Value) -> Option<f64> {
	let clauses = |key: &str| -> Vec<Value> {
		match body.get(key) {
			Some(Value::Array(items)) => items.clone(),
			Some(item @ Value::Object(_)) => vec![item.clone()],
			_ => Vec::new(),
		}
	};
	let filter = clauses("filter");
	let must = clauses("must");
	let should = clauses("should");
	let must_not = clauses("must_not");

	if !filter.iter().all(|q| eval_query(q, doc).is_some()) {
		return None;
	}
	if must_not.iter().any(|q| eval_query(q, doc).is_some()) {
		return None;
	}

	let mut score = 0.0;

	for q in &must {
		score += eval_query(q, doc)?;
	}

	let should_scores: Vec<f64> = should.iter().filter_map(|q| eval_query(q, doc)).collect();
	let default_min = if must.is_empty() && filter.is_empty() && !should.is_empty() { 1 } else { 0 };
	let min_should = body
		.get("minimum_should_match")
		.and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
		.unwrap_or(default_min) as usize;

	if should_scores.len() < min_should {
		return None;
	}

	Some(score + should_scores.iter().sum::<f64>())
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
	let mut current = vec![doc];

	for segment in path.split('.') {
		let mut next = Vec::new();

		for value in current {
			match value {
				Value::Array(items) => {
					for item in items {
						if let Some(found) = item.get(segment) {
							next.push(found);
						}
					}
				},
				other =>
					if let Some(found) = other.get(segment) {
						next.push(found);
					},
			}
		}

		current = next;
	}

	current
}

fn term_matches(doc: &Value, field: &str, expected: &Value) -> bool {
	if let Some(raw_field) = field.strip_suffix(".keyword") {
		return lookup(doc, raw_field).into_iter().any(|value| value == expected);
	}

	match expected {
		Value::String(token) => field_tokens(doc, field).contains(token),
		other => lookup(doc, field).into_iter().any(|value| value == other),
	}
}

fn wildcard_matches(doc: &Value, field: &str, pattern: &str) -> bool {
	let pattern = pattern.to_lowercase();

	if let Some(raw_field) = field.strip_suffix(".keyword") {
		return lookup(doc, raw_field)
			.into_iter()
			.filter_map(Value::as_str)
			.any(|value| glob(&pattern, value));
	}

	field_tokens(doc, field).iter().any(|token| glob(&pattern, token))
}

fn range_matches(doc: &Value, field: &str, spec: &Value) -> bool {
	lookup(doc, field).into_iter().filter_map(Value::as_f64).any(|value| {
		let bound = |key: &str| spec.get(key).and_then(Value::as_f64);

		bound("gte").map(|b| value >= b).unwrap_or(true)
			&& bound("lte").map(|b| value <= b).unwrap_or(true)
			&& bound("gt").map(|b| value > b).unwrap_or(true)
			&& bound("lt").map(|b| value < b).unwrap_or(true)
	})
}

fn field_tokens(doc: &Value, field: &str) -> Vec<String> {
	lookup(doc, field).into_iter().filter_map(Value::as_str).flat_map(tokenize).collect()
}

fn tokenize(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_lowercase)
		.collect()
}

/// Glob with `*` and `?`; a backslash escapes the next character.
fn glob(pattern: &str, text: &str) -> bool {
	#[derive(Clone, Copy, PartialEq)]
	enum Tok {
		Any,
		One,
		Lit(char),
	}

	let mut toks = Vec::new();
	let mut chars = pattern.chars();

	while let Some(c) = chars.next() {
		match c {
			'\\' => toks.push(Tok::Lit(chars.next().unwrap_or('\\'))),
			'*' => toks.push(Tok::Any),
			'?' => toks.push(Tok::One),
			other => toks.push(Tok::Lit(other)),
		}
	}

	let text: Vec<char> = text.chars().collect();
	// dp[j]: pattern prefix matches text prefix of length j.
	let mut dp = vec![false; text.len() + 1];

	dp[0] = true;

	for tok in toks {
		let mut next = vec![false; text.len() + 1];

		match tok {
			Tok::Any => {
				let mut reachable = false;

				for j in 0..=text.len() {
					reachable |= dp[j];
					next[j] = reachable;
				}
			},
			Tok::One =>
				for j in 1..=text.len() {
					next[j] = dp[j - 1];
				},
			Tok::Lit(c) =>
				for j in 1..=text.len() {
					next[j] = dp[j - 1] && text[j - 1] == c;
				},
		}

		dp = next;
	}

	dp[text.len()]
}

fn as_vector(value: Option<&Value>) -> Vec<f64> {
	value
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_f64).collect())
		.unwrap_or_default()
}

fn vectors_at(doc: &Value, field: &str) -> Vec<Vec<f64>> {
	lookup(doc, field)
		.into_iter()
		.map(|value| as_vector(Some(value)))
		.filter(|vector| !vector.is_empty())
		.collect()
}

/// Elasticsearch's cosine k-NN score, `(1 + cos) / 2`.
fn cosine_score(a: &[f64], b: &[f64]) -> f64 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	(1.0 + dot / (norm_a * norm_b)) / 2.0
}

fn compare_by_sort(sort: &[Value], a: (&Value, f64), b: (&Value, f64)) -> Ordering {
	for key in sort {
		let Some((field, spec)) = key.as_object().and_then(|obj| obj.iter().next()) else {
			continue;
		};
		let descending = spec.get("order").and_then(Value::as_str) == Some("desc");
		let ordering = if field == "_score" {
			a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
		} else {
			compare_values(a.0.get(field.as_str()), b.0.get(field.as_str()))
		};
		let ordering = if descending { ordering.reverse() } else { ordering };

		if ordering != Ordering::Equal {
			return ordering;
		}
	}

	Ordering::Equal
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
	match (a, b) {
		(Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
		(Some(Value::Number(x)), Some(Value::Number(y))) => x
			.as_f64()
			.unwrap_or(0.0)
			.partial_cmp(&y.as_f64().unwrap_or(0.0))
			.unwrap_or(Ordering::Equal),
		(Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
		(Some(_), None) => Ordering::Greater,
		(None, Some(_)) => Ordering::Less,
		_ => Ordering::Equal,
	}
}

fn source_excludes(body: &Value) -> Vec<String> {
	body.get("_source")
		.and_then(|source| source.get("excludes"))
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default()
}

fn strip_paths(doc: &Value, excludes: &[String]) -> Value {
	let mut out = doc.clone();

	for path in excludes {
		let segments: Vec<&str> = path.split('.').collect();

		strip_path(&mut out, &segments);
	}

	out
}

fn strip_path(value: &mut Value, segments: &[&str]) {
	let Some((head, rest)) = segments.split_first() else {
		return;
	};

	match value {
		Value::Array(items) =>
			for item in items {
				strip_path(item, segments);
			},
		Value::Object(map) =>
			if rest.is_empty() {
				map.remove(*head);
			} else if let Some(child) = map.get_mut(*head) {
				strip_path(child, rest);
			},
		_ => {},
	}
}

/// Builds an indexed listing document in the shape the external write path stores.
pub fn listing_doc(id: &str, brand: &str, description: &str, is_boosted: bool) -> Value {
	let mut doc = Map::new();

	doc.insert("id".to_string(), json!(id));
	doc.insert("user".to_string(), json!({ "user_id": "user-1", "name": "Owner" }));
	doc.insert("category".to_string(), json!({ "category_id": "cat-food", "category": "Food" }));
	doc.insert("brand".to_string(), json!(brand));
	doc.insert(
		"logo".to_string(),
		json!({ "file_path": format!("/file/{id}-logo.png"), "vector": vec![0.0_f32; 4] }),
	);
	doc.insert(
		"ad_photos".to_string(),
		json!([{ "file_path": format!("/file/{id}-ad.png"), "vector": vec![0.0_f32; 4] }]),
	);
	doc.insert("description".to_string(), json!(description));
	doc.insert("investment".to_string(), json!(250_000));
	doc.insert("monthly_revenue".to_string(), json!(40_000));
	doc.insert("roi".to_string(), json!(18));
	doc.insert("branch_count".to_string(), json!(12));
	doc.insert("year_founded".to_string(), json!(2015));
	doc.insert("website".to_string(), json!(format!("https://{id}.example")));
	doc.insert("whatsapp_contact".to_string(), json!("+620000000"));
	doc.insert("is_boosted".to_string(), json!(is_boosted));
	doc.insert("created_at".to_string(), json!("2025-01-02T03:04:05Z"));
	doc.insert("updated_at".to_string(), json!("2025-02-03T04:05:06.5+07:00"));

	Value::Object(doc)
}
