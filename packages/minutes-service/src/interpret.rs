use minutes_domain::{
	FilterField, Message, ParsedQuery,
	query::{self, ModelOutput},
};
use minutes_providers::completion::CompletionRequest;

use crate::MinutesService;

impl MinutesService {
	/// Splits one user turn into metadata filters and a semantic query.
	///
	/// Never fails. A transport error, a rejected request, or output that is not the expected
	/// JSON object all degrade to [`ParsedQuery::fallback`].
	pub async fn interpret(&self, user_text: &str) -> ParsedQuery {
		let cfg = &self.cfg.providers.llm_query;
		let request = CompletionRequest {
			messages: vec![Message::system(interpreter_prompt()), Message::user(user_text)],
			max_tokens: None,
			temperature: cfg.temperature,
		};
		let response = match self.providers.completion.complete(cfg, &request).await {
			Ok(response) => response,
			Err(err) => {
				tracing::warn!(error = %err, "Query interpreter call failed. Using the raw message.");

				return ParsedQuery::fallback(user_text);
			},
		};

		if !response.is_success() {
			tracing::warn!(
				status = response.status,
				"Query interpreter was rejected. Using the raw message."
			);

			return ParsedQuery::fallback(user_text);
		}

		let Some(raw) = response.content() else {
			tracing::warn!("Query interpreter returned no content. Using the raw message.");

			return ParsedQuery::fallback(user_text);
		};

		match query::parse_model_output(raw) {
			Ok(ModelOutput { parsed, dropped_filter_keys }) => {
				if !dropped_filter_keys.is_empty() {
					tracing::debug!(dropped = ?dropped_filter_keys, "Dropped unsupported filter keys.");
				}

				parsed
			},
			Err(reason) => {
				tracing::warn!(
					reason = reason.as_str(),
					"Query interpreter output is not usable. Using the raw message."
				);

				ParsedQuery::fallback(user_text)
			},
		}
	}
}

pub fn interpreter_prompt() -> String {
	let fields = FilterField::ALL
		.iter()
		.map(|field| format!("- {}{}", field.as_str(), field_hint(*field)))
		.collect::<Vec<_>>()
		.join("\n");

	format!(
		"\
You turn questions about recorded meetings into database lookups.
Split the request into metadata filters and a free-text semantic query.

Filter fields you may use:
{fields}

Comparisons use objects with $gt, $lt, or $eq. Omit any field the request does not constrain.
Set semantic_query to null when the filters alone answer the request.

Respond with one JSON object and nothing else:
{{\"filters\": {{...}}, \"semantic_query\": \"...\" or null}}"
	)
}

fn field_hint(field: FilterField) -> &'static str {
	match field {
		FilterField::MeetingDate => " (YYYY-MM-DD)",
		FilterField::MeetingDurationMinutes => " (number of minutes, supports comparisons)",
		FilterField::Invitees => " (list of names)",
		FilterField::InviteesEmail => " (list of email addresses)",
		FilterField::FathomUserName | FilterField::FathomUserEmail => "",
	}
}
