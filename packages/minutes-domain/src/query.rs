use serde_json::Value;

use crate::filter::Filter;

/// Query interpreter output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
	pub filters: Filter,
	/// `None` means no vector retrieval happens for this turn.
	pub semantic_query: Option<String>,
}
impl ParsedQuery {
	/// The deterministic recovery used whenever the model output cannot be interpreted: the
	/// whole user text becomes the semantic query and nothing is filtered.
	pub fn fallback(user_text: &str) -> Self {
		Self { filters: Filter::new(), semantic_query: Some(user_text.to_string()) }
	}

	/// Semantic query, if one exists and is not blank.
	pub fn retrieval_query(&self) -> Option<&str> {
		self.semantic_query.as_deref().filter(|query| !query.trim().is_empty())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
	pub parsed: ParsedQuery,
	pub dropped_filter_keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOutputError {
	NotJson,
	NotAnObject,
	MissingFilters,
	MissingSemanticQuery,
}
impl ModelOutputError {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::NotJson => "not_json",
			Self::NotAnObject => "not_an_object",
			Self::MissingFilters => "missing_filters",
			Self::MissingSemanticQuery => "missing_semantic_query",
		}
	}
}

/// Parses the raw text of an interpreter completion.
///
/// The object must carry a `filters` object and a `semantic_query` that is a string or `null`.
/// Any other shape is an error; callers recover with [`ParsedQuery::fallback`].
pub fn parse_model_output(raw: &str) -> Result<ModelOutput, ModelOutputError> {
	let value: Value = serde_json::from_str(raw.trim()).map_err(|_| ModelOutputError::NotJson)?;
	let object = value.as_object().ok_or(ModelOutputError::NotAnObject)?;
	let filters = object
		.get("filters")
		.filter(|filters| filters.is_object())
		.ok_or(ModelOutputError::MissingFilters)?;
	let semantic_query = match object.get("semantic_query") {
		Some(Value::String(query)) => Some(query.clone()),
		Some(Value::Null) => None,
		_ => return Err(ModelOutputError::MissingSemanticQuery),
	};
	let (filters, dropped_filter_keys) = Filter::sanitize(filters);

	Ok(ModelOutput { parsed: ParsedQuery { filters, semantic_query }, dropped_filter_keys })
}

/// [`parse_model_output`] with the fallback applied.
pub fn interpret_model_output(raw: &str, user_text: &str) -> ParsedQuery {
	parse_model_output(raw)
		.map(|output| output.parsed)
		.unwrap_or_else(|_| ParsedQuery::fallback(user_text))
}
