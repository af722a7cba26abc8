use crate::message::Message;

/// Longest prefix of `messages` whose total content length stays within `budget` characters.
///
/// Walks from the oldest message and stops at the first one that would overflow the budget, so
/// later (possibly shorter) messages are never pulled forward. A first message larger than the
/// budget yields an empty slice.
pub fn truncate(messages: &[Message], budget: usize) -> &[Message] {
	let mut used = 0_usize;
	let mut kept = 0_usize;

	for message in messages {
		let next = used.saturating_add(message.char_len());

		if next > budget {
			break;
		}

		used = next;
		kept += 1;
	}

	&messages[..kept]
}
