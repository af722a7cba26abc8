use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::{Table, Value};

use minutes_config::Config;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_table() -> Table {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn section<'a>(root: &'a mut Table, path: &[&str]) -> &'a mut Table {
	let mut table = root;

	for key in path {
		table = table
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	table
}

fn render(table: &Table) -> String {
	toml::to_string(table).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("minutes_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn expect_validation(table: &Table, expected: &str) {
	let err = minutes_config::parse(&render(table)).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads_from_disk() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let result = minutes_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg: Config = result.expect("Sample config must load.");

	assert_eq!(cfg.retrieval.index, "meetings");
	assert_eq!(cfg.retrieval.top_k, 5);
	assert_eq!(cfg.chat.history_char_budget, 12_000);
	assert_eq!(cfg.providers.embedding.path, "/embeddings");
	assert_eq!(cfg.providers.llm_chat.path, "/chat/completions");
	assert_eq!(
		cfg.providers.vector.query_url(&cfg.retrieval.index),
		"https://meetings-abc123.svc.pinecone.io/query"
	);
	assert_eq!(cfg.single_turn.max_tokens, 800);
	assert_eq!(cfg.single_turn.temperature, 0.0);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("minutes_config_test_does_not_exist.toml");
	let err = minutes_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, minutes_config::Error::ReadConfig { .. }));
	assert!(err.to_string().contains("minutes_config_test_does_not_exist.toml"));
}

#[test]
fn defaults_apply_when_sections_are_omitted() {
	let mut table = sample_table();

	table.remove("chat");
	section(&mut table, &["retrieval"]).remove("top_k");

	let cfg = minutes_config::parse(&render(&table)).expect("Config must parse.");

	assert_eq!(cfg.retrieval.top_k, 5);
	assert_eq!(cfg.chat.history_char_budget, 12_000);
	assert_eq!(cfg.chat.max_tokens, 800);
	assert!(cfg.chat.system_prompt.contains("{context}"));
}

#[test]
fn query_temperature_must_be_zero() {
	let mut table = sample_table();

	section(&mut table, &["providers", "llm_query"])
		.insert("temperature".to_string(), Value::Float(0.7));

	expect_validation(&table, "providers.llm_query.temperature must be 0.");
}

#[test]
fn api_keys_must_be_non_empty() {
	let mut table = sample_table();

	section(&mut table, &["providers", "vector"])
		.insert("api_key".to_string(), Value::String("  ".to_string()));

	expect_validation(&table, "Provider vector api_key must be non-empty.");
}

#[test]
fn env_references_resolve_from_process_environment() {
	let mut table = sample_table();

	section(&mut table, &["providers", "embedding"])
		.insert("api_key".to_string(), Value::String("env:PATH".to_string()));

	let cfg = minutes_config::parse(&render(&table)).expect("Config must parse.");

	assert_eq!(cfg.providers.embedding.api_key, env::var("PATH").unwrap_or_default());
}

#[test]
fn unset_env_reference_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["retrieval"]).insert(
		"index".to_string(),
		Value::String("env:MINUTES_CONFIG_TEST_UNSET_INDEX_NAME".to_string()),
	);

	expect_validation(&table, "retrieval.index must be non-empty.");
}

#[test]
fn chat_prompt_requires_context_placeholder() {
	let mut table = sample_table();

	section(&mut table, &["chat"])
		.insert("system_prompt".to_string(), Value::String("No placeholder.".to_string()));

	expect_validation(&table, "chat.system_prompt must contain {context}.");
}

#[test]
fn single_turn_template_requires_question_placeholder() {
	let mut table = sample_table();
	let mut single_turn = Table::new();

	single_turn.insert("user_template".to_string(), Value::String("{context}".to_string()));
	table.insert("single_turn".to_string(), Value::Table(single_turn));

	expect_validation(&table, "single_turn.user_template must contain {question}.");
}

#[test]
fn zero_budget_is_rejected() {
	let mut table = sample_table();

	section(&mut table, &["chat"])
		.insert("history_char_budget".to_string(), Value::Integer(0));

	expect_validation(&table, "chat.history_char_budget must be greater than zero.");
}

#[test]
fn zero_dimensions_are_rejected() {
	let mut table = sample_table();

	section(&mut table, &["providers", "embedding"])
		.insert("dimensions".to_string(), Value::Integer(0));

	expect_validation(&table, "providers.embedding.dimensions must be greater than zero.");
}
