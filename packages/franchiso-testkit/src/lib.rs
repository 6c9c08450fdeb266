pub mod config;
pub mod corpus;

mod error;

pub use config::{TEST_TEXT_DIM, test_config};
pub use corpus::{Corpus, listing_doc};
pub use error::{Error, Result};

use std::{
	collections::HashMap,
	future::IntoFuture,
	sync::{Arc, Mutex},
};

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing,
};
use serde_json::{Value, json};
use tokio::{
	net::TcpListener,
	sync::oneshot::{self, Sender},
};

/// Binds `app` on an ephemeral loopback port. Dropping the returned sender stops the server.
pub async fn spawn_server(app: Router) -> Result<(String, Sender<()>)> {
	let listener = TcpListener::bind("127.0.0.1:0").await?;
	let addr = listener.local_addr()?;
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		if let Err(err) = server.into_future().await {
			eprintln!("Stub server failed: {err}.");
		}
	});

	Ok((format!("http://{addr}"), tx))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
	pub method: &'static str,
	pub path: String,
	pub body: Value,
}

/// Serves `_search`, `_count` and `_doc` for one index out of a [`Corpus`].
#[derive(Debug, Default)]
pub struct StubElasticsearch {
	pub corpus: Corpus,
	requests: Mutex<Vec<RecordedRequest>>,
	fail_status: Mutex<Option<u16>>,
}
impl StubElasticsearch {
	pub fn new(corpus: Corpus) -> Arc<Self> {
		Arc::new(Self { corpus, ..Default::default() })
	}

	pub fn router(self: &Arc<Self>) -> Router {
		Router::new()
			.route("/{index}/_search", routing::post(search_handler))
			.route("/{index}/_count", routing::post(count_handler))
			.route("/{index}/_doc/{id}", routing::get(doc_handler))
			.with_state(self.clone())
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Makes every subsequent request answer with `status`.
	pub fn fail_with(&self, status: u16) {
		*self.fail_status.lock().unwrap_or_else(|err| err.into_inner()) = Some(status);
	}

	fn record(&self, method: &'static str, path: String, body: Value) -> Option<Response> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).push(RecordedRequest {
			method,
			path,
			body,
		});

		let status = (*self.fail_status.lock().unwrap_or_else(|err| err.into_inner()))?;
		let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		Some((status, Json(json!({ "error": { "type": "stub_failure" }, "status": status.as_u16() }))).into_response())
	}
}

async fn search_handler(
	State(stub): State<Arc<StubElasticsearch>>,
	Path(index): Path<String>,
	Json(body): Json<Value>,
) -> Response {
	if let Some(failure) = stub.record("POST", format!("/{index}/_search"), body.clone()) {
		return failure;
	}

	Json(stub.corpus.search(&body)).into_response()
}

async fn count_handler(
	State(stub): State<Arc<StubElasticsearch>>,
	Path(index): Path<String>,
	Json(body): Json<Value>,
) -> Response {
	if let Some(failure) = stub.record("POST", format!("/{index}/_count"), body.clone()) {
		return failure;
	}

	Json(json!({ "count": stub.corpus.count(&body) })).into_response()
}

async fn doc_handler(
	State(stub): State<Arc<StubElasticsearch>>,
	Path((index, id)): Path<(String, String)>,
	Query(params): Query<HashMap<String, String>>,
) -> Response {
	if let Some(failure) = stub.record("GET", format!("/{index}/_doc/{id}"), Value::Null) {
		return failure;
	}

	let excludes: Vec<String> = params
		.get("_source_excludes")
		.map(|raw| raw.split(',').map(str::to_string).collect())
		.unwrap_or_default();

	match stub.corpus.get(&id, &excludes) {
		Some(source) =>
			Json(json!({ "_index": index, "_id": id, "found": true, "_source": source })).into_response(),
		None => (StatusCode::NOT_FOUND, Json(json!({ "_index": index, "_id": id, "found": false })))
			.into_response(),
	}
}
