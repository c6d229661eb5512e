//! Outbound message channel.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Delivers one structured message to `recipient`. Any non-success status, or a body reporting a
/// non-zero `code`, is a delivery failure.
pub async fn send(
	cfg: &orgscope_config::NotifyProviderConfig,
	recipient: &str,
	content: &Value,
) -> Result<()> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&envelope(recipient, content))
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await.unwrap_or(Value::Null);

	check_reply(&json)
}

fn envelope(recipient: &str, content: &Value) -> Value {
	serde_json::json!({
		"receive_id": recipient,
		"msg_type": "post",
		"content": { "en_us": content },
	})
}

fn check_reply(json: &Value) -> Result<()> {
	match json.get("code").and_then(Value::as_i64) {
		None | Some(0) => Ok(()),
		Some(code) => {
			let msg = json.get("msg").and_then(Value::as_str).unwrap_or("unknown error");

			Err(eyre::eyre!("Notification channel rejected the message with code {code}: {msg}."))
		},
	}
}
