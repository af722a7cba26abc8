pub mod completion;
pub mod embedding;
pub mod sse;
pub mod stream;
pub mod vector;

mod error;

pub use error::{Error, Result};

use reqwest::{
	Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

const API_KEY_HEADER: &str = "api-key";
const MAX_RAW_DETAIL_CHARS: usize = 200;

/// `Authorization: Bearer` plus configured extra headers.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	extend_headers(headers, default_headers)
}

/// `Api-Key` plus configured extra headers, as vector index services expect.
pub fn api_key_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	let mut value = HeaderValue::from_str(api_key)?;

	value.set_sensitive(true);
	headers.insert(HeaderName::from_static(API_KEY_HEADER), value);

	extend_headers(headers, default_headers)
}

/// Human-readable diagnostic for a failed provider call.
///
/// Prefers the provider's nested `error.message`, then up to 200 characters of the raw body,
/// then the status line alone.
pub fn describe_failure(provider: &str, status: StatusCode, body: &str) -> String {
	let mut message = format!("{provider} API error: {status}");
	let nested = serde_json::from_str::<Value>(body).ok().and_then(|json| {
		json.pointer("/error/message").and_then(Value::as_str).map(str::to_string)
	});

	if let Some(detail) = nested {
		message.push_str(" - ");
		message.push_str(&detail);
	} else if !body.trim().is_empty() {
		message.push_str(" - ");
		message.extend(body.trim().chars().take(MAX_RAW_DETAIL_CHARS));
	}

	message
}

fn extend_headers(
	mut headers: HeaderMap,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) async fn upstream_error(provider: &str, res: Response) -> Error {
	let status = res.status();
	let text = res.text().await.unwrap_or_default();
	let message = describe_failure(provider, status, &text);
	let body = serde_json::from_str::<Value>(&text)
		.ok()
		.or_else(|| (!text.is_empty()).then(|| Value::String(text.clone())));

	Error::Upstream { status: Some(status.as_u16()), message, body }
}
