use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::Result;
use minutes_config::LlmProviderConfig;
use minutes_domain::Message;

/// Chat completion parameters; the model comes from provider config.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
	pub messages: Vec<Message>,
	pub max_tokens: Option<u32>,
	pub temperature: f32,
}
impl CompletionRequest {
	pub fn body<'a>(&'a self, model: &'a str, stream: bool) -> CompletionBody<'a> {
		CompletionBody {
			model,
			messages: &self.messages,
			max_tokens: self.max_tokens,
			temperature: self.temperature,
			stream,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct CompletionBody<'a> {
	pub model: &'a str,
	pub messages: &'a [Message],
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_tokens: Option<u32>,
	pub temperature: f32,
	pub stream: bool,
}

/// A non-streaming completion exactly as the provider answered it, success or not.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
	pub status: u16,
	pub body: Value,
}
impl CompletionResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub fn choices(&self) -> Option<&Value> {
		self.body.get("choices")
	}

	/// `choices[0].message.content`.
	pub fn content(&self) -> Option<&str> {
		self.body.pointer("/choices/0/message/content").and_then(Value::as_str)
	}
}

/// Transport failures are errors; provider rejections come back as a response so callers can
/// decide whether to mirror or recover from them.
pub async fn complete(
	cfg: &LlmProviderConfig,
	request: &CompletionRequest,
) -> Result<CompletionResponse> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&request.body(&cfg.model, false))
		.send()
		.await?;
	let status = res.status().as_u16();
	let text = res.text().await?;
	let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

	Ok(CompletionResponse { status, body })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn body_omits_unset_max_tokens() {
		let request = CompletionRequest {
			messages: vec![Message::system("s"), Message::user("u")],
			max_tokens: None,
			temperature: 0.0,
		};
		let body = serde_json::to_value(request.body("m", false)).expect("encode failed");

		assert!(body.get("max_tokens").is_none());
		assert_eq!(body["model"], "m");
		assert_eq!(body["stream"], false);
		assert_eq!(body["messages"][0]["role"], "system");
		assert_eq!(body["messages"][1]["content"], "u");
	}

	#[test]
	fn reads_first_choice_content() {
		let response = CompletionResponse {
			status: 200,
			body: serde_json::json!({
				"choices": [{ "message": { "role": "assistant", "content": "{}" } }]
			}),
		};

		assert!(response.is_success());
		assert_eq!(response.content(), Some("{}"));
	}
}
