use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub tokenizer: Tokenizer,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
	/// Prefix joined with a member's profile path to build the rendered profile link.
	#[serde(default)]
	pub profile_url_base: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub directory: DirectoryProviderConfig,
	pub notify: NotifyProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct NotifyProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	/// Link attached to each phrase heading in outbound messages.
	#[serde(default)]
	pub app_url: String,
	#[serde(default = "default_notify_title")]
	pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Tokenizer {
	pub stop_words: Vec<String>,
}
impl Default for Tokenizer {
	fn default() -> Self {
		Self {
			stop_words: ["a", "an", "and", "for", "in", "of", "on", "or", "the", "to", "with"]
				.into_iter()
				.map(str::to_string)
				.collect(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub page_size: u32,
	/// Number of entries rendered per phrase in a notification section.
	pub notify_page_size: u32,
	/// Search-frequency fragments are truncated to this many characters.
	pub max_fragment_chars: u32,
	pub highlight: SearchHighlight,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			page_size: 20,
			notify_page_size: 10,
			max_fragment_chars: 31,
			highlight: SearchHighlight::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchHighlight {
	pub open_tag: String,
	pub close_tag: String,
}
impl Default for SearchHighlight {
	fn default() -> Self {
		Self { open_tag: "<em>".to_string(), close_tag: "</em>".to_string() }
	}
}

/// Longest accepted rebuild or notify interval.
pub const MAX_INTERVAL_SECONDS: u64 = 366 * 24 * 3_600;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub rebuild_interval_seconds: u64,
	pub notify_interval_seconds: u64,
	pub poll_interval_ms: u64,
}
impl Default for Worker {
	fn default() -> Self {
		Self {
			rebuild_interval_seconds: 4 * 3_600,
			notify_interval_seconds: 3_600,
			poll_interval_ms: 1_000,
		}
	}
}

fn default_notify_title() -> String {
	"Subscription notification".to_string()
}
