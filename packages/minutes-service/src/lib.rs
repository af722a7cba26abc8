pub mod chat;
pub mod handle;
pub mod interpret;
pub mod retrieve;

mod error;

pub use chat::{AnswerStream, SingleTurnReply};
pub use error::{Error, Result};
pub use handle::SharedHandle;

use std::{future::Future, pin::Pin, sync::Arc};

use minutes_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, VectorProviderConfig};
use minutes_domain::{Filter, Match};
use minutes_providers::{
	completion::{self, CompletionRequest, CompletionResponse},
	embedding,
	stream::{self, FragmentStream},
	vector::VectorIndex,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, minutes_providers::Result<Vec<f32>>>;
}

pub trait VectorProvider
where
	Self: Send + Sync,
{
	/// The default implementation shares one client per process, so every call must pass the
	/// same `cfg`.
	fn query<'a>(
		&'a self,
		cfg: &'a VectorProviderConfig,
		index: &'a str,
		vector: &'a [f32],
		top_k: Option<u32>,
		filter: Option<&'a Filter>,
	) -> BoxFuture<'a, minutes_providers::Result<Vec<Match>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, minutes_providers::Result<CompletionResponse>>;

	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, minutes_providers::Result<FragmentStream>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub vector: Arc<dyn VectorProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		vector: Arc<dyn VectorProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, vector, completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), vector: provider.clone(), completion: provider }
	}
}

pub struct MinutesService {
	pub cfg: Config,
	pub providers: Providers,
}
impl MinutesService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}

/// Vector index client shared by every request in the process, built on first use from the
/// first `providers.vector` config it sees. Later calls with another config are rejected.
static VECTOR_INDEX: SharedHandle<VectorIndex> = SharedHandle::new();

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, minutes_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}
impl VectorProvider for DefaultProviders {
	fn query<'a>(
		&'a self,
		cfg: &'a VectorProviderConfig,
		index: &'a str,
		vector: &'a [f32],
		top_k: Option<u32>,
		filter: Option<&'a Filter>,
	) -> BoxFuture<'a, minutes_providers::Result<Vec<Match>>> {
		Box::pin(async move {
			let client = VECTOR_INDEX.get_or_try_init(|| VectorIndex::new(cfg))?;

			client.ensure_config(cfg)?;
			client.query(index, vector, top_k, filter).await
		})
	}
}
impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, minutes_providers::Result<CompletionResponse>> {
		Box::pin(completion::complete(cfg, request))
	}

	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, minutes_providers::Result<FragmentStream>> {
		Box::pin(stream::stream(cfg, request))
	}
}
