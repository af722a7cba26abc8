use serde::Serialize;
use serde_json::{Map, Value};

/// One retrieved neighbour. Sequences of matches keep the provider's descending-score order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
	pub id: String,
	pub score: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Map<String, Value>>,
}
impl Match {
	/// Reads one provider match; `None` when `id` is missing or `score` is not numeric.
	pub fn from_value(raw: &Value) -> Option<Self> {
		let id = raw.get("id").and_then(Value::as_str)?.to_string();
		let score = raw.get("score").and_then(Value::as_f64)?;
		let metadata = raw.get("metadata").and_then(Value::as_object).cloned();

		Some(Self { id, score, metadata })
	}

	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}

	/// The `text` metadata field, or `""` when it is absent or not a string.
	pub fn text(&self) -> &str {
		self.metadata
			.as_ref()
			.and_then(|metadata| metadata.get("text"))
			.and_then(Value::as_str)
			.unwrap_or("")
	}
}

/// Keeps well-formed matches in their original order.
pub fn scored_matches(raw: &[Value]) -> Vec<Match> {
	raw.iter().filter_map(Match::from_value).collect()
}
