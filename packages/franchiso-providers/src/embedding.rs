use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

const TARGET: &str = "text embedding provider";

pub async fn embed(
	cfg: &franchiso_config::TextEmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()
		.map_err(|err| Error::from_reqwest(TARGET, err))?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;
	let json: Value = crate::check_status(TARGET, res)
		.await?
		.json()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;

	parse_embedding_response(json, texts.len(), cfg.dimensions as usize)
}

fn parse_embedding_response(json: Value, expected: usize, dimensions: usize) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		if vec.len() != dimensions {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding {index} has {} components, expected {dimensions}.",
					vec.len()
				),
			});
		}

		indexed.push((index, vec));
	}

	if indexed.len() != expected {
		return Err(Error::InvalidResponse {
			message: format!("Embedding response has {} vectors, expected {expected}.", indexed.len()),
		});
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json, 2, 2).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn rejects_vector_count_mismatch() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": [1.0] }] });

		assert!(parse_embedding_response(json, 2, 1).is_err());
	}

	#[test]
	fn rejects_non_numeric_components() {
		let json = serde_json::json!({ "data": [{ "embedding": ["x"] }] });

		assert!(matches!(parse_embedding_response(json, 1, 1), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn rejects_vectors_of_the_wrong_dimension() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": [1.0, 2.0] }] });
		let err = parse_embedding_response(json, 1, 1).expect_err("Expected dimension mismatch.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
		assert!(err.to_string().contains("expected 1"));
	}
}
