use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use minutes_config::{CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER};
use minutes_domain::{Message, context, history};
use minutes_providers::completion::CompletionRequest;

use crate::{Error, MinutesService, Result};

/// Answer fragments in generation order. An `Err` item ends the stream.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub enum SingleTurnReply {
	/// The provider's `choices` array, untouched.
	Choices(Value),
	/// The provider refused the completion; callers mirror this to their client.
	Rejected { status: u16, body: Value },
}

impl MinutesService {
	/// One-shot answer to a single question, without query interpretation or filtering.
	pub async fn answer(&self, message: &str) -> Result<SingleTurnReply> {
		let matches = self.retrieve(message, None).await?;
		let context = context::assemble(&matches);
		let cfg = &self.cfg.single_turn;
		let user = context::render(
			&cfg.user_template,
			&[(CONTEXT_PLACEHOLDER, context.as_str()), (QUESTION_PLACEHOLDER, message)],
		);
		let request = CompletionRequest {
			messages: vec![Message::system(cfg.system_prompt.as_str()), Message::user(user)],
			max_tokens: Some(cfg.max_tokens),
			temperature: cfg.temperature,
		};
		let response =
			self.providers.completion.complete(&self.cfg.providers.llm_chat, &request).await?;

		if !response.is_success() {
			tracing::warn!(status = response.status, "Completion was rejected.");

			return Ok(SingleTurnReply::Rejected { status: response.status, body: response.body });
		}

		Ok(SingleTurnReply::Choices(response.choices().cloned().unwrap_or(Value::Null)))
	}

	/// Grounded, streamed reply to the last turn of `messages`.
	///
	/// Everything up to the first fragment runs before this returns, so provider failures at
	/// that stage surface as `Err` rather than as a stream item.
	pub async fn chat_stream(&self, messages: &[Message]) -> Result<AnswerStream> {
		let Some(last) = messages.last() else {
			return Err(Error::Validation { message: "messages must not be empty.".to_string() });
		};
		let parsed = self.interpret(&last.content).await;
		let matches = match parsed.retrieval_query() {
			Some(query) => self.retrieve(query, Some(&parsed.filters)).await?,
			None => {
				tracing::debug!("No semantic query derived. Skipping retrieval.");

				Vec::new()
			},
		};
		let context = context::assemble(&matches);
		let cfg = &self.cfg.chat;
		let kept = history::truncate(messages, cfg.history_char_budget);

		if kept.len() < messages.len() {
			tracing::debug!(
				kept = kept.len(),
				dropped = messages.len() - kept.len(),
				"Truncated chat history."
			);
		}

		let mut prompt = Vec::with_capacity(kept.len() + 1);

		prompt.push(Message::system(context::render(
			&cfg.system_prompt,
			&[(CONTEXT_PLACEHOLDER, context.as_str())],
		)));
		prompt.extend_from_slice(kept);

		let request = CompletionRequest {
			messages: prompt,
			max_tokens: Some(cfg.max_tokens),
			temperature: self.cfg.providers.llm_chat.temperature,
		};
		let fragments =
			self.providers.completion.stream(&self.cfg.providers.llm_chat, &request).await?;

		Ok(Box::pin(fragments.map(|item| item.map_err(Error::from))))
	}
}
