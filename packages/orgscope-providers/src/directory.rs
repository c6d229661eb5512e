//! Pull source for member records.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use orgscope_domain::MemberRecord;

pub async fn fetch_members(
	cfg: &orgscope_config::DirectoryProviderConfig,
) -> Result<Vec<MemberRecord>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.get(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_members(json)
}

/// Accepts either `{ "items": [...] }` or a bare array. A structured `content` value is kept as
/// its JSON text so every record carries its blob as a string.
fn parse_members(json: Value) -> Result<Vec<MemberRecord>> {
	let items = match json {
		Value::Array(items) => items,
		Value::Object(mut body) => match body.remove("items") {
			Some(Value::Array(items)) => items,
			_ => return Err(eyre::eyre!("Directory response is missing items array.")),
		},
		_ => return Err(eyre::eyre!("Directory response must be an object or an array.")),
	};
	let mut records = Vec::with_capacity(items.len());

	for mut item in items {
		if let Some(content) = item.get_mut("content")
			&& (content.is_object() || content.is_array())
		{
			*content = Value::String(content.to_string());
		}

		records.push(serde_json::from_value(item)?);
	}

	Ok(records)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_items_and_stringifies_content() {
		let json = serde_json::json!({
			"items": [
				{ "id": "ou_1", "name": "Alice", "manager_id": "" },
				{
					"id": "ou_2",
					"name": "Bob",
					"manager_id": "ou_1",
					"content": { "objective_list": [] }
				}
			]
		});
		let records = parse_members(json).expect("parse failed");

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].manager_id, None);
		assert_eq!(records[1].content, r#"{"objective_list":[]}"#);
	}

	#[test]
	fn rejects_unexpected_shapes() {
		assert!(parse_members(serde_json::json!({ "data": [] })).is_err());
		assert!(parse_members(serde_json::json!("nope")).is_err());
	}
}
