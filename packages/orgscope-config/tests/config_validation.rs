use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use orgscope_config::{Config, Error, MAX_INTERVAL_SECONDS};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn set_field(value: &mut Value, table_path: &[&str], key: &str, field: Value) {
	let mut table = value.as_table_mut().expect("Template config must be a table.");

	for segment in table_path {
		table = table
			.get_mut(*segment)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{segment}]."));
	}

	table.insert(key.to_string(), field);
}

fn remove_table(value: &mut Value, key: &str) {
	value.as_table_mut().expect("Template config must be a table.").remove(key);
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

	path.push(format!("orgscope_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_value(value: &Value) -> orgscope_config::Result<Config> {
	let payload = toml::to_string(value).expect("Failed to render template config.");
	let path = write_temp_config(payload);
	let result = orgscope_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_message(value: &Value, expected: &str) {
	let err = load_value(value).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_value(&sample_value()).expect("Sample config must load.");

	assert_eq!(cfg.search.page_size, 20);
	assert_eq!(cfg.search.notify_page_size, 10);
	assert_eq!(cfg.providers.notify.title, "OKR subscription notification");
	assert_eq!(cfg.tokenizer.stop_words, vec!["the".to_string(), "and".into(), "of".into()]);
}

#[test]
fn blank_api_keys_become_none() {
	let mut value = sample_value();

	set_field(&mut value, &["providers", "directory"], "api_key", Value::String("  ".into()));

	let cfg = load_value(&value).expect("Config must load.");

	assert!(cfg.providers.directory.api_key.is_none());
	assert_eq!(cfg.providers.notify.api_key.as_deref(), Some("notify-key"));
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let mut value = sample_value();

	remove_table(&mut value, "search");
	remove_table(&mut value, "worker");
	remove_table(&mut value, "tokenizer");

	let cfg = load_value(&value).expect("Config must load.");

	assert_eq!(cfg.search.page_size, 20);
	assert_eq!(cfg.search.highlight.open_tag, "<em>");
	assert_eq!(cfg.worker.notify_interval_seconds, 3_600);
	assert!(cfg.tokenizer.stop_words.iter().any(|word| word == "the"));
}

#[test]
fn page_size_must_be_positive() {
	let mut value = sample_value();

	set_field(&mut value, &["search"], "page_size", Value::Integer(0));

	expect_validation_message(&value, "search.page_size must be greater than zero.");
}

#[test]
fn highlight_tags_must_be_non_empty() {
	let mut value = sample_value();

	set_field(&mut value, &["search", "highlight"], "close_tag", Value::String(String::new()));

	expect_validation_message(&value, "search.highlight.open_tag and search.highlight.close_tag");
}

#[test]
fn provider_api_base_must_be_non_empty() {
	let mut value = sample_value();

	set_field(&mut value, &["providers", "notify"], "api_base", Value::String(" ".into()));

	expect_validation_message(&value, "Provider notify api_base must be non-empty.");
}

#[test]
fn worker_intervals_must_be_positive() {
	let mut value = sample_value();

	set_field(&mut value, &["worker"], "notify_interval_seconds", Value::Integer(0));

	expect_validation_message(&value, "worker.notify_interval_seconds must be greater than zero.");
}

#[test]
fn worker_intervals_are_bounded() {
	let mut value = sample_value();

	set_field(&mut value, &["worker"], "rebuild_interval_seconds", Value::Integer(i64::MAX));

	expect_validation_message(
		&value,
		&format!("worker.rebuild_interval_seconds must be at most {MAX_INTERVAL_SECONDS}."),
	);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("orgscope_config_test_missing.toml");
	let err = orgscope_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn malformed_toml_reports_parse_error() {
	let path = write_temp_config("[service\nlog_level = ".to_string());
	let result = orgscope_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(matches!(result, Err(Error::ParseConfig { .. })));
}
