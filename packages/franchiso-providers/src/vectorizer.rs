use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const TARGET: &str = "image vectorizer";

#[derive(Debug, Serialize)]
struct VectorRequest<'a> {
	file_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct VectorResponse {
	vector: Vec<f32>,
}

/// Asks the vectorizer to embed the image stored at `file_path` on the storage proxy.
pub async fn vectorize(
	cfg: &franchiso_config::ImageVectorizerConfig,
	file_path: &str,
) -> Result<Vec<f32>> {
	if file_path.trim().is_empty() {
		return Err(Error::InvalidArgument { message: "Image file path must be non-empty.".to_string() });
	}

	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()
		.map_err(|err| Error::from_reqwest(TARGET, err))?;
	let res = client
		.post(&cfg.url)
		.json(&VectorRequest { file_path })
		.send()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;
	let parsed: VectorResponse = crate::check_status(TARGET, res)
		.await?
		.json()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;

	check_dimensions(parsed.vector, cfg.dimensions as usize)
}

fn check_dimensions(vector: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
	if vector.len() != expected {
		return Err(Error::InvalidResponse {
			message: format!(
				"Image vector has {} components, expected {expected}.",
				vector.len()
			),
		});
	}

	Ok(vector)
}
