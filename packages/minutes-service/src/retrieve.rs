use minutes_domain::{Filter, Match};

use crate::{MinutesService, Result};

impl MinutesService {
	/// Embeds `query` and fetches its nearest transcript chunks from the configured index.
	///
	/// An empty embedding means there is nothing to search with, so no lookup is made.
	pub async fn retrieve(&self, query: &str, filter: Option<&Filter>) -> Result<Vec<Match>> {
		let cfg = &self.cfg;
		let vector = self.providers.embedding.embed(&cfg.providers.embedding, query).await?;

		if vector.is_empty() {
			tracing::debug!("Embedding is empty. Skipping retrieval.");

			return Ok(Vec::new());
		}

		let matches = self
			.providers
			.vector
			.query(
				&cfg.providers.vector,
				&cfg.retrieval.index,
				&vector,
				Some(cfg.retrieval.top_k),
				filter.and_then(Filter::non_empty),
			)
			.await?;

		tracing::debug!(
			index = %cfg.retrieval.index,
			filtered = filter.is_some_and(|filter| !filter.is_empty()),
			matches = matches.len(),
			"Retrieved context."
		);

		Ok(matches)
	}
}
