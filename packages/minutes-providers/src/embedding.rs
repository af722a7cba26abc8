use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use minutes_config::EmbeddingProviderConfig;

/// Embeds one text. An empty `data` array yields an empty vector, which callers treat as "skip
/// retrieval".
pub async fn embed(cfg: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": text,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	if !res.status().is_success() {
		return Err(crate::upstream_error(&cfg.provider_id, res).await);
	}

	let json: Value = res.json().await?;
	let vector = parse_embedding_response(json)?;

	if let Some(dimensions) = cfg.dimensions
		&& !vector.is_empty()
		&& vector.len() != dimensions as usize
	{
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding vector dimension mismatch: expected {dimensions}, got {}.",
				vector.len()
			),
		});
	}

	Ok(vector)
}

fn parse_embedding_response(json: Value) -> Result<Vec<f32>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let Some(item) = data.first() else {
		return Ok(Vec::new());
	};
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

	Ok(vec)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_first_embedding() {
		let json = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [0.5, 1.5] },
				{ "index": 1, "embedding": [2.0, 3.0] }
			]
		});
		let parsed = parse_embedding_response(json).expect("parse failed");

		assert_eq!(parsed, vec![0.5, 1.5]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "embedding": [0.5, "x"] }] });

		assert!(parse_embedding_response(json).is_err());
	}

	#[test]
	fn empty_data_is_an_empty_vector() {
		let json = serde_json::json!({ "data": [] });

		assert!(parse_embedding_response(json).expect("parse failed").is_empty());
	}
}
