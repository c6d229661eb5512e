//! Immutable view published by a rebuild: the hierarchy plus the searchable corpus.

use std::collections::{BTreeSet, HashMap};

use orgscope_domain::{
	MemberId, MemberProfile, MemberRecord, StructuralError,
	hierarchy::{HierarchyBuild, HierarchyIndex},
	okr::OkrDocument,
};

use crate::Tokenizer;

#[derive(Clone, Debug)]
pub struct MemberEntry {
	pub profile: MemberProfile,
	pub okr: OkrDocument,
	pub tokens: BTreeSet<String>,
	pub(crate) content_hash: blake3::Hash,
}

#[derive(Debug, Default)]
pub struct OrgSnapshot {
	pub hierarchy: HierarchyIndex,
	members: HashMap<MemberId, MemberEntry>,
	order: Vec<MemberId>,
	postings: HashMap<String, Vec<MemberId>>,
}
impl OrgSnapshot {
	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// A real member with a record. Placeholders and departed members resolve to `None`.
	pub fn member(&self, id: &str) -> Option<&MemberEntry> {
		self.members.get(id)
	}

	pub fn member_entry(&self, id: &str) -> Option<(&MemberId, &MemberEntry)> {
		self.members.get_key_value(id)
	}

	/// Members in hierarchy construction order.
	pub fn members(&self) -> impl Iterator<Item = (&MemberId, &MemberEntry)> {
		self.order.iter().filter_map(|id| self.members.get(id).map(|entry| (id, entry)))
	}

	/// Ids whose content produced `token`, in member order.
	pub fn postings(&self, token: &str) -> &[MemberId] {
		self.postings.get(token).map(Vec::as_slice).unwrap_or_default()
	}

	/// Members whose content produced every token in `tokens`, in member order.
	pub fn postings_all(&self, tokens: &BTreeSet<String>) -> Vec<&MemberId> {
		let mut tokens = tokens.iter();
		let Some(first) = tokens.next() else { return Vec::new() };
		let rest = tokens.collect::<Vec<_>>();

		self.postings(first)
			.iter()
			.filter(|id| {
				self.members
					.get(*id)
					.is_some_and(|entry| rest.iter().all(|token| entry.tokens.contains(*token)))
			})
			.collect()
	}

	/// Members whose display name contains `folded_term`, compared case-insensitively.
	pub fn members_named_like(&self, folded_term: &str) -> Vec<&MemberId> {
		self.members()
			.filter(|(_, entry)| entry.profile.name.to_lowercase().contains(folded_term))
			.map(|(id, _)| id)
			.collect()
	}

	pub(crate) fn build(
		records: &[MemberRecord],
		previous: &OrgSnapshot,
		tokenizer: &dyn Tokenizer,
	) -> SnapshotBuild {
		let HierarchyBuild { index, rejected } = HierarchyIndex::build(records);
		let mut accepted: HashMap<&MemberId, &MemberRecord> = HashMap::new();

		for record in records {
			if record.manager_id.as_ref() != Some(&record.id) {
				accepted.entry(&record.id).or_insert(record);
			}
		}

		let mut snapshot = OrgSnapshot::default();
		let mut tokenizer_failures = 0;

		for node in index.members() {
			let (Some(profile), Some(record)) = (node.profile(), accepted.get(node.id())) else {
				continue;
			};
			let content_hash = blake3::hash(record.content.as_bytes());
			let entry = match previous.members.get(node.id()) {
				Some(entry) if entry.content_hash == content_hash =>
					MemberEntry { profile: profile.clone(), ..entry.clone() },
				_ => {
					let (okr, tokens) = match analyze(&record.content, tokenizer) {
						Ok(analyzed) => analyzed,
						Err(err) => {
							tracing::warn!(
								member_id = %node.id(),
								error = %err,
								"Member content contributes no tokens."
							);

							tokenizer_failures += 1;

							(OkrDocument::default(), BTreeSet::new())
						},
					};

					MemberEntry { profile: profile.clone(), okr, tokens, content_hash }
				},
			};

			for token in &entry.tokens {
				snapshot.postings.entry(token.clone()).or_default().push(node.id().clone());
			}

			snapshot.order.push(node.id().clone());
			snapshot.members.insert(node.id().clone(), entry);
		}

		snapshot.hierarchy = index;

		SnapshotBuild { snapshot, rejected, tokenizer_failures }
	}
}

pub(crate) struct SnapshotBuild {
	pub(crate) snapshot: OrgSnapshot,
	pub(crate) rejected: Vec<StructuralError>,
	pub(crate) tokenizer_failures: usize,
}

fn analyze(
	content: &str,
	tokenizer: &dyn Tokenizer,
) -> Result<(OkrDocument, BTreeSet<String>), orgscope_domain::ContentError> {
	let okr = OkrDocument::from_blob(content)?;
	let tokens = tokenizer.tokenize(&okr.plain_text())?;

	Ok((okr, tokens))
}
