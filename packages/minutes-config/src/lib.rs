mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CONTEXT_PLACEHOLDER, Chat, Config, EmbeddingProviderConfig, INDEX_PLACEHOLDER,
	LlmProviderConfig, Providers, QUESTION_PLACEHOLDER, Retrieval, Service, SingleTurn,
	VectorProviderConfig,
};

use std::{env, fs, path::Path};

const ENV_PREFIX: &str = "env:";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	finish(cfg)
}

pub fn parse(raw: &str) -> Result<Config> {
	let cfg: Config = toml::from_str(raw).map_err(|err| Error::ParseInline { source: err })?;

	finish(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_query", &cfg.providers.llm_query.api_key),
		("llm_chat", &cfg.providers.llm_chat.api_key),
		("vector", &cfg.providers.vector.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if let Some(dimensions) = cfg.providers.embedding.dimensions
		&& dimensions == 0
	{
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, temperature) in [
		("providers.llm_query.temperature", cfg.providers.llm_query.temperature),
		("providers.llm_chat.temperature", cfg.providers.llm_chat.temperature),
		("single_turn.temperature", cfg.single_turn.temperature),
	] {
		if !temperature.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if temperature < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if cfg.providers.llm_query.temperature != 0.0 {
		return Err(Error::Validation {
			message: "providers.llm_query.temperature must be 0.".to_string(),
		});
	}
	if cfg.retrieval.index.trim().is_empty() {
		return Err(Error::Validation {
			message: "retrieval.index must be non-empty.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.history_char_budget == 0 {
		return Err(Error::Validation {
			message: "chat.history_char_budget must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.max_tokens == 0 || cfg.single_turn.max_tokens == 0 {
		return Err(Error::Validation {
			message: "chat.max_tokens and single_turn.max_tokens must be greater than zero."
				.to_string(),
		});
	}
	if !cfg.chat.system_prompt.contains(CONTEXT_PLACEHOLDER) {
		return Err(Error::Validation {
			message: format!("chat.system_prompt must contain {CONTEXT_PLACEHOLDER}."),
		});
	}

	for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
		if !cfg.single_turn.user_template.contains(placeholder) {
			return Err(Error::Validation {
				message: format!("single_turn.user_template must contain {placeholder}."),
			});
		}
	}

	Ok(())
}

fn finish(mut cfg: Config) -> Result<Config> {
	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

fn normalize(cfg: &mut Config) {
	for value in [
		&mut cfg.providers.embedding.api_key,
		&mut cfg.providers.llm_query.api_key,
		&mut cfg.providers.llm_chat.api_key,
		&mut cfg.providers.vector.api_key,
		&mut cfg.retrieval.index,
	] {
		resolve_env(value);
	}
}

// `env:NAME` reads NAME from the process environment; unset variables resolve to "".
fn resolve_env(value: &mut String) {
	let Some(name) = value.trim().strip_prefix(ENV_PREFIX) else {
		return;
	};

	*value = env::var(name.trim()).unwrap_or_default();
}
