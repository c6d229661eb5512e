mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DirectoryProviderConfig, NotifyProviderConfig, Postgres, Providers, Search,
	MAX_INTERVAL_SECONDS, SearchHighlight, Service, Storage, Tokenizer, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, api_base) in [
		("directory", &cfg.providers.directory.api_base),
		("notify", &cfg.providers.notify.api_base),
	] {
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
	}
	for (label, timeout_ms) in [
		("directory", cfg.providers.directory.timeout_ms),
		("notify", cfg.providers.notify.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.search.page_size == 0 {
		return Err(Error::Validation {
			message: "search.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.notify_page_size == 0 {
		return Err(Error::Validation {
			message: "search.notify_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_fragment_chars == 0 {
		return Err(Error::Validation {
			message: "search.max_fragment_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.search.highlight.open_tag.is_empty() || cfg.search.highlight.close_tag.is_empty() {
		return Err(Error::Validation {
			message: "search.highlight.open_tag and search.highlight.close_tag must be non-empty."
				.to_string(),
		});
	}

	for (label, seconds) in [
		("rebuild_interval_seconds", cfg.worker.rebuild_interval_seconds),
		("notify_interval_seconds", cfg.worker.notify_interval_seconds),
	] {
		if seconds == 0 {
			return Err(Error::Validation {
				message: format!("worker.{label} must be greater than zero."),
			});
		}
		if seconds > MAX_INTERVAL_SECONDS {
			return Err(Error::Validation {
				message: format!("worker.{label} must be at most {MAX_INTERVAL_SECONDS}."),
			});
		}
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for key in [&mut cfg.providers.directory.api_key, &mut cfg.providers.notify.api_key] {
		if key.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
			*key = None;
		}
	}

	let mut stop_words = Vec::with_capacity(cfg.tokenizer.stop_words.len());

	for word in &cfg.tokenizer.stop_words {
		let word = word.trim().to_lowercase();

		if !word.is_empty() && !stop_words.contains(&word) {
			stop_words.push(word);
		}
	}

	cfg.tokenizer.stop_words = stop_words;
}
