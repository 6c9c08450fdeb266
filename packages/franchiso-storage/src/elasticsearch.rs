use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
	pub hits: Hits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hits {
	pub total: TotalHits,
	#[serde(default)]
	pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotalHits {
	pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "_source", default)]
	pub source: Value,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
	count: u64,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
	#[serde(default)]
	found: bool,
	#[serde(rename = "_source", default)]
	source: Option<Value>,
}

/// Thin JSON-over-HTTP client for the single listings index.
pub struct ElasticsearchStore {
	client: Client,
	base: Url,
	pub index: String,
	username: Option<String>,
	password: Option<String>,
}
impl ElasticsearchStore {
	pub fn new(cfg: &franchiso_config::Elasticsearch) -> Result<Self> {
		let base = Url::parse(&cfg.url).map_err(|err| {
			Error::InvalidArgument(format!("Invalid Elasticsearch URL {:?}: {err}.", cfg.url))
		})?;

		if base.cannot_be_a_base() {
			return Err(Error::InvalidArgument(format!(
				"Elasticsearch URL {:?} cannot carry a path.",
				cfg.url
			)));
		}

		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			client,
			base,
			index: cfg.index.clone(),
			username: cfg.username.clone(),
			password: cfg.password.clone(),
		})
	}

	pub async fn search(&self, body: &Value) -> Result<SearchResponse> {
		let url = self.endpoint(&["_search"])?;
		let res = self.authorize(self.client.post(url).json(body)).send().await?;

		Ok(check_status(res).await?.json().await?)
	}

	pub async fn count(&self, body: &Value) -> Result<u64> {
		let url = self.endpoint(&["_count"])?;
		let res = self.authorize(self.client.post(url).json(body)).send().await?;
		let parsed: CountResponse = check_status(res).await?.json().await?;

		Ok(parsed.count)
	}

	/// Fetches one document's source. A missing document is `Ok(None)`.
	pub async fn get_source(&self, id: &str, excludes: &[&str]) -> Result<Option<Value>> {
		let mut url = self.endpoint(&["_doc", id])?;

		if !excludes.is_empty() {
			url.query_pairs_mut().append_pair("_source_excludes", &excludes.join(","));
		}

		let res = self.authorize(self.client.get(url)).send().await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let parsed: GetResponse = check_status(res).await?.json().await?;

		if !parsed.found {
			return Ok(None);
		}

		Ok(parsed.source)
	}

	fn endpoint(&self, tail: &[&str]) -> Result<Url> {
		let mut url = self.base.clone();

		{
			let mut segments = url.path_segments_mut().map_err(|_| {
				Error::InvalidArgument("Elasticsearch URL cannot carry a path.".to_string())
			})?;

			segments.pop_if_empty().push(&self.index).extend(tail);
		}

		Ok(url)
	}

	fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match self.username.as_deref() {
			Some(username) => builder.basic_auth(username, self.password.as_deref()),
			None => builder,
		}
	}
}

async fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let body = res.text().await.unwrap_or_default();

	Err(Error::Status { status: status.as_u16(), body })
}
