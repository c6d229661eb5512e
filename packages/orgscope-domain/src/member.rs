use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque directory identity of a member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);
impl MemberId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_string(self) -> String {
		self.0
	}
}
impl fmt::Display for MemberId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl Borrow<str> for MemberId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for MemberId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<&str> for MemberId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}
impl From<String> for MemberId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Display attributes carried through to rendered results. Never interpreted by the index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
	pub name: String,
	#[serde(default)]
	pub en_name: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub avatar: String,
	/// Path appended to the configured profile URL base.
	#[serde(default)]
	pub profile_path: String,
}

/// One row pulled from the directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
	pub id: MemberId,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub manager_id: Option<MemberId>,
	#[serde(flatten)]
	pub profile: MemberProfile,
	/// Raw OKR content blob.
	#[serde(default)]
	pub content: String,
}
impl MemberRecord {
	pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			manager_id: None,
			profile: MemberProfile { name: name.into(), ..Default::default() },
			content: String::new(),
		}
	}

	pub fn with_manager(mut self, manager_id: impl Into<MemberId>) -> Self {
		let manager_id = manager_id.into();

		self.manager_id = if manager_id.is_empty() { None } else { Some(manager_id) };

		self
	}

	pub fn with_content(mut self, content: impl Into<String>) -> Self {
		self.content = content.into();

		self
	}
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<MemberId>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: Option<String> = Option::deserialize(deserializer)?;

	Ok(raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()).map(MemberId))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_manager_deserializes_as_root() {
		let record: MemberRecord = serde_json::from_value(serde_json::json!({
			"id": "ou_1",
			"manager_id": "",
			"name": "Alice",
		}))
		.expect("Failed to decode record.");

		assert_eq!(record.manager_id, None);
		assert_eq!(record.profile.name, "Alice");
		assert!(record.content.is_empty());
	}

	#[test]
	fn manager_is_kept_when_present() {
		let record: MemberRecord = serde_json::from_value(serde_json::json!({
			"id": "ou_2",
			"manager_id": "ou_1",
			"name": "Bob",
			"avatar": "https://cdn/bob.png",
		}))
		.expect("Failed to decode record.");

		assert_eq!(record.manager_id, Some(MemberId::from("ou_1")));
		assert_eq!(record.profile.avatar, "https://cdn/bob.png");
	}
}
