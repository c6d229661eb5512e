use std::{
	collections::{BTreeSet, HashSet},
	sync::{Arc, atomic::Ordering},
};

use serde::Serialize;

use orgscope_domain::{MemberRecord, phrase};

use crate::{
	OrgService, OrgSnapshot, Result,
	Tokenizer,
	ranking::{self, HIGH_RECOMMEND_PREFIX, RESULT_PREFIX},
	snapshot::SnapshotBuild,
};

const DIRECT_SUBORDINATES_PREFIX: &str = "subordinates:direct:";
const ALL_SUBORDINATES_PREFIX: &str = "subordinates:all:";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
	pub member_count: usize,
	pub rejected_count: usize,
	pub tokenizer_failures: usize,
	pub changed_tokens: usize,
	pub purged_phrases: usize,
}

/// What moved between two snapshots, as far as cached phrases are concerned.
#[derive(Debug, Default)]
pub(crate) struct SnapshotDiff {
	pub(crate) tokens: HashSet<String>,
	/// Lowercased display names of members that joined, left, or were renamed.
	pub(crate) names: Vec<String>,
}
impl SnapshotDiff {
	pub(crate) fn between(old: &OrgSnapshot, new: &OrgSnapshot) -> Self {
		let mut diff = Self::default();

		for (id, before) in old.members() {
			match new.member(id.as_str()) {
				None => {
					diff.tokens.extend(before.tokens.iter().cloned());
					diff.names.push(before.profile.name.to_lowercase());
				},
				Some(after) => {
					if before.content_hash != after.content_hash {
						diff.tokens
							.extend(before.tokens.symmetric_difference(&after.tokens).cloned());
					}
					if before.profile.name != after.profile.name {
						diff.names.push(before.profile.name.to_lowercase());
						diff.names.push(after.profile.name.to_lowercase());
					}
				},
			}
		}

		for (id, after) in new.members() {
			if old.member(id.as_str()).is_none() {
				diff.tokens.extend(after.tokens.iter().cloned());
				diff.names.push(after.profile.name.to_lowercase());
			}
		}

		diff
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.tokens.is_empty() && self.names.is_empty()
	}

	/// Whether a cached result for `phrase` may no longer match a fresh ranking.
	pub(crate) fn touches(&self, phrase: &str, tokenizer: &dyn Tokenizer) -> bool {
		let folded = phrase.to_lowercase();

		self.tokens.contains(&folded)
			|| phrase::terms(&folded).iter().any(|term| {
				let tokens = ranking::term_tokens(tokenizer, term);

				tokens.iter().any(|token| self.tokens.contains(token))
					|| self.names.iter().any(|name| name.contains(term))
			})
	}
}

impl OrgService {
	/// Pulls the directory and rebuilds from it.
	pub async fn rebuild(&self) -> Result<RebuildReport> {
		let records = self.providers.directory.fetch_members(&self.cfg.providers.directory).await?;

		Ok(self.rebuild_from_records(&records))
	}

	/// Builds a snapshot off to the side, publishes it with one swap, then purges cached phrases
	/// the change can affect and republishes the flattened subordinate lists.
	pub fn rebuild_from_records(&self, records: &[MemberRecord]) -> RebuildReport {
		let _rebuild = self.lock_rebuild();
		let previous = self.live.load_full();
		let SnapshotBuild { snapshot, rejected, tokenizer_failures } =
			OrgSnapshot::build(records, &previous, self.providers.tokenizer.as_ref());

		for err in &rejected {
			tracing::warn!(
				member_id = %err.member_id(),
				error = %err,
				"Directory record rejected."
			);
		}

		let diff = SnapshotDiff::between(&previous, &snapshot);
		let next = Arc::new(snapshot);
		let purged_phrases = {
			let _gate = self.cache_gate.write().unwrap_or_else(|err| err.into_inner());

			self.live.store(next.clone());
			self.published.store(true, Ordering::Release);

			self.purge_phrases(&diff)
		};

		self.publish_subordinates(&next);

		let report = RebuildReport {
			member_count: next.len(),
			rejected_count: rejected.len(),
			tokenizer_failures,
			changed_tokens: diff.tokens.len(),
			purged_phrases,
		};

		tracing::info!(
			member_count = report.member_count,
			rejected_count = report.rejected_count,
			tokenizer_failures = report.tokenizer_failures,
			changed_tokens = report.changed_tokens,
			purged_phrases = report.purged_phrases,
			"Rebuild published."
		);

		report
	}

	fn purge_phrases(&self, diff: &SnapshotDiff) -> usize {
		if diff.is_empty() {
			return 0;
		}

		let mut purged = 0;

		// The high-recommend entry exists for every cached phrase, even one with no matches.
		for key in self.cache.scan_prefix(HIGH_RECOMMEND_PREFIX) {
			let Some(phrase) = key.strip_prefix(HIGH_RECOMMEND_PREFIX) else { continue };

			if !diff.touches(phrase, self.providers.tokenizer.as_ref()) {
				continue;
			}

			self.cache.delete(&key);
			self.cache.delete(&format!("{RESULT_PREFIX}{phrase}"));

			tracing::debug!(phrase, "Cached search result purged.");

			purged += 1;
		}

		purged
	}

	fn publish_subordinates(&self, snapshot: &OrgSnapshot) {
		let mut stale = self
			.cache
			.scan_prefix(DIRECT_SUBORDINATES_PREFIX)
			.into_iter()
			.chain(self.cache.scan_prefix(ALL_SUBORDINATES_PREFIX))
			.collect::<BTreeSet<_>>();

		for node in snapshot.hierarchy.members().filter(|node| !node.is_leaf()) {
			let id = node.id().as_str();
			let direct_key = format!("{DIRECT_SUBORDINATES_PREFIX}{id}");
			let all_key = format!("{ALL_SUBORDINATES_PREFIX}{id}");
			let direct = snapshot.hierarchy.direct_subordinates(id);
			let all = snapshot.hierarchy.all_subordinates(id);

			stale.remove(&direct_key);
			stale.remove(&all_key);
			self.cache
				.replace_list(&direct_key, direct.into_iter().map(|id| id.to_string()).collect());
			self.cache.replace_list(&all_key, all.into_iter().map(|id| id.to_string()).collect());
		}

		for key in stale {
			self.cache.delete(&key);
		}
	}
}
