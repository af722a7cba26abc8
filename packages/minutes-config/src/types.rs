use serde::Deserialize;
use serde_json::{Map, Value};

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";
pub const INDEX_PLACEHOLDER: &str = "{index}";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub retrieval: Retrieval,
	#[serde(default)]
	pub chat: Chat,
	#[serde(default)]
	pub single_turn: SingleTurn,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Model used by the query interpreter. Temperature must stay at zero.
	pub llm_query: LlmProviderConfig,
	/// Model used to generate answers.
	pub llm_chat: LlmProviderConfig,
	pub vector: VectorProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_embedding_path")]
	pub path: String,
	pub model: String,
	/// Optional. When set, responses of any other length are rejected.
	pub dimensions: Option<u32>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_completion_path")]
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct VectorProviderConfig {
	pub provider_id: String,
	/// May contain `{index}`, replaced by the queried index name.
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_query_path")]
	pub path: String,
	#[serde(default = "default_namespace")]
	pub namespace: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl VectorProviderConfig {
	pub fn query_url(&self, index: &str) -> String {
		format!("{}{}", self.api_base.replace(INDEX_PLACEHOLDER, index), self.path)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Retrieval {
	pub index: String,
	#[serde(default = "default_top_k")]
	pub top_k: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Chat {
	pub history_char_budget: usize,
	pub max_tokens: u32,
	/// Must contain `{context}`.
	pub system_prompt: String,
}
impl Default for Chat {
	fn default() -> Self {
		Self {
			history_char_budget: 12_000,
			max_tokens: 800,
			system_prompt: "\
You are an assistant that answers questions about meetings using transcript excerpts.
Only rely on the context below. When the context does not contain the answer, say so plainly.
Mention participants, dates, and decisions when they are relevant.

Context:
{context}"
				.to_string(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SingleTurn {
	pub max_tokens: u32,
	pub temperature: f32,
	pub system_prompt: String,
	/// Must contain `{context}` and `{question}`.
	pub user_template: String,
}
impl Default for SingleTurn {
	fn default() -> Self {
		Self {
			max_tokens: 800,
			temperature: 0.0,
			system_prompt: "Use the following context to answer the user's question.".to_string(),
			user_template: "{context}\n\nUser question: {question}".to_string(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_embedding_path() -> String {
	"/embeddings".to_string()
}

fn default_completion_path() -> String {
	"/chat/completions".to_string()
}

fn default_query_path() -> String {
	"/query".to_string()
}

fn default_namespace() -> String {
	"default".to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_top_k() -> u32 {
	5
}
