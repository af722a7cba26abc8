use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};
use minutes_config::VectorProviderConfig;
use minutes_domain::{Filter, Match, matches};

pub const DEFAULT_TOP_K: u32 = 5;

/// Query body for a nearest-neighbour lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
	pub vector: &'a [f32],
	pub top_k: u32,
	pub include_metadata: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub namespace: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter: Option<&'a Filter>,
}
impl<'a> QueryRequest<'a> {
	/// Empty filters are dropped here so they never reach the wire as `{}`.
	pub fn new(
		vector: &'a [f32],
		top_k: Option<u32>,
		namespace: &'a str,
		filter: Option<&'a Filter>,
	) -> Self {
		Self {
			vector,
			top_k: top_k.unwrap_or(DEFAULT_TOP_K),
			include_metadata: true,
			namespace: Some(namespace).filter(|namespace| !namespace.is_empty()),
			filter: filter.and_then(Filter::non_empty),
		}
	}
}

/// Client for a hosted vector index. Holds no per-request state, so one instance is shared by
/// every request in the process.
#[derive(Debug)]
pub struct VectorIndex {
	client: Client,
	cfg: VectorProviderConfig,
}
impl VectorIndex {
	pub fn new(cfg: &VectorProviderConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::api_key_headers(&cfg.api_key, &cfg.default_headers)?)
			.build()?;

		Ok(Self { client, cfg: cfg.clone() })
	}

	/// Fails when `cfg` is not the configuration this client was built from. The client bakes in
	/// the endpoint and key, so it cannot serve a different one.
	pub fn ensure_config(&self, cfg: &VectorProviderConfig) -> Result<()> {
		if self.cfg != *cfg {
			return Err(Error::InvalidConfig {
				message: format!(
					"Vector index client was built for {} and cannot serve {}.",
					self.cfg.api_base, cfg.api_base
				),
			});
		}

		Ok(())
	}

	pub async fn query(
		&self,
		index: &str,
		vector: &[f32],
		top_k: Option<u32>,
		filter: Option<&Filter>,
	) -> Result<Vec<Match>> {
		let request = QueryRequest::new(vector, top_k, &self.cfg.namespace, filter);
		let res = self.client.post(self.cfg.query_url(index)).json(&request).send().await?;

		if !res.status().is_success() {
			return Err(crate::upstream_error(&self.cfg.provider_id, res).await);
		}

		let json: Value = res.json().await?;

		Ok(parse_query_response(&json))
	}
}

/// Missing `matches` (for example an empty namespace) is an empty result, not an error.
pub fn parse_query_response(json: &Value) -> Vec<Match> {
	let Some(raw) = json.get("matches").and_then(Value::as_array) else {
		return Vec::new();
	};
	let kept = matches::scored_matches(raw);

	if kept.len() < raw.len() {
		tracing::debug!(discarded = raw.len() - kept.len(), "Discarded unscored matches.");
	}

	kept
}

#[cfg(test)]
mod tests {
	use super::*;
	use minutes_domain::{FilterField, filter::Condition};

	#[test]
	fn empty_filter_is_omitted() {
		let vector = [0.1_f32, 0.2];
		let filter = Filter::new();
		let request = QueryRequest::new(&vector, None, "default", Some(&filter));
		let json = serde_json::to_value(&request).expect("encode failed");

		assert!(json.get("filter").is_none());
		assert_eq!(json["topK"], 5);
		assert_eq!(json["includeMetadata"], true);
		assert_eq!(json["namespace"], "default");
	}

	#[test]
	fn non_empty_filter_is_sent() {
		let vector = [0.1_f32];
		let filter = Filter::new()
			.with(FilterField::FathomUserName, Condition::Literal(serde_json::json!("Dana")));
		let request = QueryRequest::new(&vector, Some(3), "", Some(&filter));
		let json = serde_json::to_value(&request).expect("encode failed");

		assert_eq!(json["filter"], serde_json::json!({ "fathom_user_name": "Dana" }));
		assert_eq!(json["topK"], 3);
		assert!(json.get("namespace").is_none());
	}

	fn provider_config(api_base: &str) -> VectorProviderConfig {
		VectorProviderConfig {
			provider_id: "pinecone".to_string(),
			api_base: api_base.to_string(),
			api_key: "vector-key".to_string(),
			path: "/query".to_string(),
			namespace: "default".to_string(),
			timeout_ms: 1_000,
			default_headers: serde_json::Map::new(),
		}
	}

	#[test]
	fn client_rejects_a_different_config() {
		let built_for = provider_config("https://a.example");
		let index = VectorIndex::new(&built_for).expect("Failed to build vector client.");

		assert!(index.ensure_config(&built_for).is_ok());

		let err = index
			.ensure_config(&provider_config("https://b.example"))
			.expect_err("Expected a config mismatch.");

		assert!(matches!(err, Error::InvalidConfig { .. }));
		assert!(err.to_string().contains("https://b.example"));
	}

	#[test]
	fn missing_matches_is_empty() {
		assert!(parse_query_response(&serde_json::json!({ "namespace": "" })).is_empty());
		assert!(parse_query_response(&serde_json::json!({ "matches": null })).is_empty());
	}
}
