//! Incremental `text/event-stream` decoder.
//!
//! [`SseDecoder`] consumes arbitrary byte chunks and returns the events completed by each chunk.
//! Lines, events, and multi-byte characters may all straddle chunk boundaries.

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
	Message(SseMessage),
	/// A `retry:` reconnection hint in milliseconds.
	Retry(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseMessage {
	pub event: Option<String>,
	pub data: String,
	pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
	line: Vec<u8>,
	after_cr: bool,
	seen_first_line: bool,
	data: Option<String>,
	event: Option<String>,
	last_id: Option<String>,
}
impl SseDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
		let mut events = Vec::new();

		for &byte in chunk {
			if self.after_cr {
				self.after_cr = false;

				if byte == b'\n' {
					continue;
				}
			}

			match byte {
				b'\n' => self.end_line(&mut events),
				b'\r' => {
					self.end_line(&mut events);

					self.after_cr = true;
				},
				_ => self.line.push(byte),
			}
		}

		events
	}

	/// Flushes state at end of input. A trailing line without a terminator is processed and an
	/// event still missing its blank line is dispatched.
	pub fn finish(&mut self) -> Vec<SseEvent> {
		let mut events = Vec::new();

		if !self.line.is_empty() {
			self.end_line(&mut events);
		}

		self.dispatch(&mut events);

		events
	}

	fn end_line(&mut self, events: &mut Vec<SseEvent>) {
		let raw = std::mem::take(&mut self.line);
		let decoded = String::from_utf8_lossy(&raw);
		let mut line = decoded.as_ref();

		if !self.seen_first_line {
			self.seen_first_line = true;
			line = line.strip_prefix(BOM).unwrap_or(line);
		}

		self.process_line(line, events);
	}

	fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
		if line.is_empty() {
			self.dispatch(events);

			return;
		}
		if line.starts_with(':') {
			return;
		}

		let (field, value) = match line.split_once(':') {
			Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
			None => (line, ""),
		};

		match field {
			"data" => match self.data.as_mut() {
				Some(data) => {
					data.push('\n');
					data.push_str(value);
				},
				None => self.data = Some(value.to_string()),
			},
			"event" => self.event = Some(value.to_string()),
			"id" =>
				if !value.contains('\0') {
					self.last_id = Some(value.to_string());
				},
			"retry" =>
				if !value.is_empty()
					&& value.bytes().all(|byte| byte.is_ascii_digit())
					&& let Ok(millis) = value.parse()
				{
					events.push(SseEvent::Retry(millis));
				},
			_ => {},
		}
	}

	fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
		let event = self.event.take();
		let Some(data) = self.data.take() else {
			return;
		};

		events.push(SseEvent::Message(SseMessage { event, data, id: self.last_id.clone() }));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn data_of(events: &[SseEvent]) -> Vec<&str> {
		events
			.iter()
			.filter_map(|event| match event {
				SseEvent::Message(message) => Some(message.data.as_str()),
				SseEvent::Retry(_) => None,
			})
			.collect()
	}

	#[test]
	fn one_chunk_can_hold_several_events() {
		let mut decoder = SseDecoder::new();
		let events = decoder.feed(b"data: a\n\ndata: b\n\ndata: c");

		assert_eq!(data_of(&events), vec!["a", "b"]);
		assert_eq!(data_of(&decoder.finish()), vec!["c"]);
	}

	#[test]
	fn events_are_rebuilt_across_chunks() {
		let mut decoder = SseDecoder::new();
		let mut events = Vec::new();

		for chunk in ["da", "ta: {\"x\"", ":1}\r", "\n", "\r\n"] {
			events.extend(decoder.feed(chunk.as_bytes()));
		}

		assert_eq!(data_of(&events), vec!["{\"x\":1}"]);
	}

	#[test]
	fn multibyte_characters_survive_chunk_splits() {
		let bytes = "data: café\n\n".as_bytes();
		let split = bytes.iter().position(|b| *b == 0xC3).expect("missing lead byte") + 1;
		let mut decoder = SseDecoder::new();
		let mut events = decoder.feed(&bytes[..split]);

		events.extend(decoder.feed(&bytes[split..]));

		assert_eq!(data_of(&events), vec!["café"]);
	}

	#[test]
	fn parses_fields_comments_and_retry_hints() {
		let mut decoder = SseDecoder::new();
		let events = decoder.feed(
			"\u{feff}: keep-alive\nretry: 3000\nretry: soon\nevent: delta\nid: 7\ndata:x\ndata\ndata: y\n\n"
				.as_bytes(),
		);

		assert_eq!(
			events,
			vec![
				SseEvent::Retry(3_000),
				SseEvent::Message(SseMessage {
					event: Some("delta".to_string()),
					data: "x\n\ny".to_string(),
					id: Some("7".to_string()),
				}),
			]
		);
	}

	#[test]
	fn blank_lines_without_data_dispatch_nothing() {
		let mut decoder = SseDecoder::new();

		assert!(decoder.feed(b"\n\nevent: ping\n\n").is_empty());
		assert!(decoder.finish().is_empty());
	}
}
