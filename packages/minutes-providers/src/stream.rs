use std::{collections::VecDeque, pin::Pin, time::Duration};

use futures_util::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde_json::Value;

use crate::{
	Error, Result,
	completion::CompletionRequest,
	sse::{SseDecoder, SseEvent},
};
use minutes_config::LlmProviderConfig;

/// Payload that ends a completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Text fragments in arrival order. Ends after `[DONE]`; an `Err` item is always the last one.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

enum Frame {
	Fragment(String),
	Ignored,
	Done,
	Failed(Error),
}

struct DecodeState<S> {
	body: Pin<Box<S>>,
	decoder: SseDecoder,
	pending: VecDeque<SseEvent>,
	exhausted: bool,
}

/// Opens a streaming completion.
///
/// Non-success responses fail here, before any fragment exists, with the provider diagnostic
/// assembled by [`crate::describe_failure`]. `timeout_ms` bounds connection setup only, since
/// an answer may legitimately stream for longer.
pub async fn stream(
	cfg: &LlmProviderConfig,
	request: &CompletionRequest,
) -> Result<FragmentStream> {
	let client = Client::builder().connect_timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&request.body(&cfg.model, true))
		.send()
		.await?;

	if !res.status().is_success() {
		return Err(crate::upstream_error(&cfg.provider_id, res).await);
	}

	Ok(Box::pin(decode_fragments(res.bytes_stream())))
}

/// Turns a raw event-stream body into completion fragments.
///
/// Dropping the returned stream drops `body`, which releases the upstream connection.
pub fn decode_fragments<S, B, E>(body: S) -> impl Stream<Item = Result<String>> + Send + 'static
where
	S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
	B: AsRef<[u8]> + Send + 'static,
	E: Into<Error> + Send + 'static,
{
	let state = DecodeState {
		body: Box::pin(body),
		decoder: SseDecoder::new(),
		pending: VecDeque::new(),
		exhausted: false,
	};

	stream::unfold(Some(state), |state| async move {
		let mut state = state?;

		loop {
			while let Some(event) = state.pending.pop_front() {
				match classify(event) {
					Frame::Fragment(text) => return Some((Ok(text), Some(state))),
					Frame::Ignored => {},
					Frame::Done => return None,
					Frame::Failed(err) => return Some((Err(err), None)),
				}
			}

			if state.exhausted {
				let err = Error::Protocol {
					message: format!("Completion stream ended before {DONE_SENTINEL}."),
				};

				return Some((Err(err), None));
			}

			match state.body.next().await {
				Some(Ok(chunk)) => {
					let events = state.decoder.feed(chunk.as_ref());

					state.pending.extend(events);
				},
				Some(Err(err)) => return Some((Err(err.into()), None)),
				None => {
					let events = state.decoder.finish();

					state.pending.extend(events);

					state.exhausted = true;
				},
			}
		}
	})
}

fn classify(event: SseEvent) -> Frame {
	let SseEvent::Message(message) = event else {
		return Frame::Ignored;
	};

	if message.data == DONE_SENTINEL {
		return Frame::Done;
	}

	let json: Value = match serde_json::from_str(&message.data) {
		Ok(json) => json,
		Err(err) =>
			return Frame::Failed(Error::Protocol {
				message: format!("Malformed completion stream frame: {err}."),
			}),
	};

	if let Some(error) = json.get("error").filter(|error| error.is_object()) {
		let detail = error.get("message").and_then(Value::as_str).unwrap_or("unknown error");

		return Frame::Failed(Error::Upstream {
			status: None,
			message: format!("Completion stream reported an error: {detail}"),
			body: Some(error.clone()),
		});
	}

	match json.pointer("/choices/0/delta/content").and_then(Value::as_str) {
		Some(text) => Frame::Fragment(text.to_string()),
		None => Frame::Ignored,
	}
}
