use crate::matches::Match;

/// Newline-joined `text` metadata of each match, in retrieval order.
pub fn assemble(matches: &[Match]) -> String {
	matches.iter().map(Match::text).collect::<Vec<_>>().join("\n")
}

/// Fills `template` in a single left-to-right pass.
///
/// Substituted values are copied verbatim and never rescanned, so a retrieved transcript that
/// happens to contain `{question}` stays untouched.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
	let mut out = String::with_capacity(template.len());
	let mut rest = template;

	'scan: while !rest.is_empty() {
		for (placeholder, value) in substitutions {
			if !placeholder.is_empty()
				&& let Some(tail) = rest.strip_prefix(placeholder)
			{
				out.push_str(value);

				rest = tail;

				continue 'scan;
			}
		}

		let mut chars = rest.chars();

		if let Some(ch) = chars.next() {
			out.push(ch);
		}

		rest = chars.as_str();
	}

	out
}
