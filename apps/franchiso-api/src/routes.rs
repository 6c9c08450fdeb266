use axum::{
	Form, Json, Router,
	body::Bytes,
	extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State, multipart::MultipartError},
	http::{StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;

use franchiso_service::{Error as ServiceError, ImageUpload, SearchRequest, SearchResponse};
use franchiso_storage::models::FranchiseListing;

use crate::state::AppState;

const IMAGE_FIELD: &str = "search_by_image";

pub fn router(state: AppState) -> Router {
	let body_limit = state.service.cfg.service.max_upload_bytes;

	Router::new()
		.route("/health", get(health))
		.route("/franchise", post(search))
		.route("/franchise/{id}", get(detail))
		.layer(DefaultBodyLimit::max(body_limit))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	SearchBody(req): SearchBody,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(req).await?;

	Ok(Json(response))
}

async fn detail(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<FranchiseListing>, ApiError> {
	let listing = state.service.get_franchise(&id).await?;

	Ok(Json(listing))
}

/// A search request decoded from JSON, multipart or form-encoded bodies.
pub struct SearchBody(pub SearchRequest);
impl<S> FromRequest<S> for SearchBody
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let content_type = req
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(str::to_ascii_lowercase)
			.unwrap_or_default();

		if content_type.starts_with("multipart/form-data") {
			let multipart = Multipart::from_request(req, state)
				.await
				.map_err(|err| ApiError::bad_request(err.body_text()))?;

			return Ok(Self(read_multipart(multipart).await?));
		}
		if content_type.starts_with("application/x-www-form-urlencoded") {
			let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
				.await
				.map_err(|err| ApiError::bad_request(err.body_text()))?;

			return Ok(Self(SearchRequest::from_fields(fields)?));
		}
		if content_type.is_empty() || content_type.starts_with("application/json") {
			let bytes = Bytes::from_request(req, state)
				.await
				.map_err(|err| ApiError::new(err.status(), err.body_text()))?;

			if bytes.iter().all(u8::is_ascii_whitespace) {
				return Ok(Self(SearchRequest::default()));
			}

			let body: Value = serde_json::from_slice(&bytes)
				.map_err(|_| ApiError::bad_request("Request body is not valid JSON."))?;

			return Ok(Self(SearchRequest::from_json(&body)?));
		}

		Err(ApiError::bad_request(format!("Unsupported content type {content_type:?}.")))
	}
}

async fn read_multipart(mut multipart: Multipart) -> Result<SearchRequest, ApiError> {
	let mut fields = Vec::new();
	let mut image = None;

	while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
		let name = field.name().unwrap_or_default().to_string();

		if name == IMAGE_FIELD {
			let file_name = field.file_name().map(str::to_string);
			let content_type = field.content_type().map(str::to_string);
			let bytes = field.bytes().await.map_err(multipart_error)?;

			if !bytes.is_empty() {
				image = Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
			}

			continue;
		}

		let value = field.text().await.map_err(multipart_error)?;

		fields.push((name, value));
	}

	let req = SearchRequest::from_fields(fields)?;

	Ok(match image {
		Some(image) => req.with_image(image),
		None => req,
	})
}

fn multipart_error(err: MultipartError) -> ApiError {
	let status = err.status();

	if status == StatusCode::PAYLOAD_TOO_LARGE {
		return ApiError::new(status, "Request body is too large.");
	}

	ApiError::bad_request(format!("Malformed multipart body: {}", err.body_text()))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}

	fn bad_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, message)
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => Self::bad_request(message),
			ServiceError::NotFound { message } => Self::new(StatusCode::NOT_FOUND, message),
			ServiceError::Unavailable { message } => {
				tracing::warn!(error = %message, "Collaborator unavailable.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, "A backing service is unavailable.")
			},
			ServiceError::BackendFailure { message } => {
				tracing::error!(error = %message, "Backend failure.");

				Self::new(StatusCode::BAD_GATEWAY, "A backing service failed.")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}
