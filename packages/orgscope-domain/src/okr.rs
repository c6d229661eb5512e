//! OKR documents carried as member content.

use serde::{Deserialize, Serialize};

use crate::{ContentError, MemberId, highlight};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkrDocument {
	#[serde(default, rename = "objective_list")]
	pub objectives: Vec<Objective>,
}
impl OkrDocument {
	/// Decodes a raw content blob. Blank content is an empty document.
	pub fn from_blob(blob: &str) -> Result<Self, ContentError> {
		if blob.trim().is_empty() {
			return Ok(Self::default());
		}

		Ok(serde_json::from_str(blob)?)
	}

	/// Every objective and key result as numbered lines.
	pub fn plain_text(&self) -> String {
		self.lines(|_| true)
	}

	/// Numbered lines restricted to objectives and key results mentioning any of `terms`,
	/// case-insensitively. Numbering still reflects each line's position in the full document.
	pub fn excerpt<S>(&self, terms: &[S]) -> String
	where
		S: AsRef<str>,
	{
		if terms.is_empty() {
			return self.plain_text();
		}

		self.lines(|text| highlight::contains_any_term(text, terms))
	}

	pub fn health(&self) -> OkrHealth {
		let healthy = self.objectives.iter().filter(|objective| objective.is_healthy()).count();

		OkrHealth { healthy, without_key_results: self.objectives.len() - healthy }
	}

	pub fn objective(&self, id: &str) -> Option<&Objective> {
		self.objectives.iter().find(|objective| objective.id == id)
	}

	fn lines<F>(&self, keep: F) -> String
	where
		F: Fn(&str) -> bool,
	{
		let mut lines = Vec::new();

		for (o, objective) in self.objectives.iter().enumerate() {
			let o = o + 1;

			if keep(&objective.content) {
				lines.push(format!("O{o}: {}", objective.content));
			}

			for (kr, key_result) in objective.key_results().iter().enumerate() {
				if keep(&key_result.content) {
					lines.push(format!("O{o}->KR{}: {}", kr + 1, key_result.content));
				}
			}
		}

		lines.join("\n")
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub content: String,
	/// Absent for objectives that were never broken down.
	#[serde(default, rename = "kr_list", skip_serializing_if = "Option::is_none")]
	pub key_results: Option<Vec<KeyResult>>,
	#[serde(default, rename = "mentioned_user_list")]
	pub mentioned: Vec<MentionedMember>,
	#[serde(default, rename = "aligned_objective_list")]
	pub aligned: Vec<AlignedObjective>,
}
impl Objective {
	/// An objective counts as healthy once it carries a key result list.
	pub fn is_healthy(&self) -> bool {
		self.key_results.is_some()
	}

	pub fn key_results(&self) -> &[KeyResult] {
		self.key_results.as_deref().unwrap_or_default()
	}

	/// Distinct members mentioned by the objective or any of its key results, first mention first.
	pub fn mentioned_members(&self) -> Vec<&MemberId> {
		let mut out: Vec<&MemberId> = Vec::new();
		let all = self
			.mentioned
			.iter()
			.chain(self.key_results().iter().flat_map(|key_result| key_result.mentioned.iter()));

		for mention in all {
			if !mention.open_id.is_empty() && !out.contains(&&mention.open_id) {
				out.push(&mention.open_id);
			}
		}

		out
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyResult {
	#[serde(default)]
	pub content: String,
	#[serde(default, rename = "mentioned_user_list")]
	pub mentioned: Vec<MentionedMember>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionedMember {
	pub open_id: MemberId,
}

/// Another member's objective aligned under this one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedObjective {
	pub id: String,
	pub owner: MentionedMember,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OkrHealth {
	pub healthy: usize,
	pub without_key_results: usize,
}
impl OkrHealth {
	/// At least one objective, and none without key results.
	pub fn is_healthy(&self) -> bool {
		self.healthy > 0 && self.without_key_results == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BLOB: &str = r#"{
		"objective_list": [
			{
				"id": "o-1",
				"content": "Grow quota coverage",
				"kr_list": [
					{ "content": "Publish the quota plan", "mentioned_user_list": [{ "open_id": "ou_b" }] },
					{ "content": "Hire two engineers" }
				],
				"mentioned_user_list": [{ "open_id": "ou_a" }, { "open_id": "ou_b" }],
				"aligned_objective_list": [{ "id": "o-9", "owner": { "open_id": "ou_c" } }]
			},
			{ "id": "o-2", "content": "Ship the launch" }
		]
	}"#;

	#[test]
	fn renders_numbered_lines() {
		let doc = OkrDocument::from_blob(BLOB).expect("Failed to decode OKR blob.");

		assert_eq!(
			doc.plain_text(),
			"O1: Grow quota coverage\nO1->KR1: Publish the quota plan\nO1->KR2: Hire two engineers\nO2: Ship the launch"
		);
	}

	#[test]
	fn excerpt_keeps_matching_lines_only() {
		let doc = OkrDocument::from_blob(BLOB).expect("Failed to decode OKR blob.");

		assert_eq!(
			doc.excerpt(&["PLAN", "launch"]),
			"O1->KR1: Publish the quota plan\nO2: Ship the launch"
		);
	}

	#[test]
	fn health_counts_objectives_with_key_results() {
		let doc = OkrDocument::from_blob(BLOB).expect("Failed to decode OKR blob.");

		assert_eq!(doc.health(), OkrHealth { healthy: 1, without_key_results: 1 });
		assert!(!doc.health().is_healthy());
		assert!(!OkrDocument::default().health().is_healthy());
		assert!(OkrHealth { healthy: 2, without_key_results: 0 }.is_healthy());
	}

	#[test]
	fn mentions_are_distinct() {
		let doc = OkrDocument::from_blob(BLOB).expect("Failed to decode OKR blob.");
		let objective = doc.objective("o-1").expect("Objective must exist.");

		assert_eq!(
			objective.mentioned_members(),
			vec![&MemberId::from("ou_a"), &MemberId::from("ou_b")]
		);
		assert_eq!(objective.aligned[0].owner.open_id, MemberId::from("ou_c"));
	}

	#[test]
	fn blank_blob_is_empty_and_garbage_fails() {
		assert_eq!(OkrDocument::from_blob("  ").map(|doc| doc.objectives.len()).ok(), Some(0));
		assert!(matches!(OkrDocument::from_blob("{not json"), Err(ContentError::Decode(_))));
	}
}
