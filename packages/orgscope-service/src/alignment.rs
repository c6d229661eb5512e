//! Objective reach: who works on each of a member's objectives and who is leveraged from outside
//! the member's reporting line.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use orgscope_domain::{MemberId, okr::Objective};

use crate::{OrgService, OrgSnapshot};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectiveStats {
	pub objective_id: String,
	/// `Obj{n}`, numbered from 1 in document order.
	pub label: String,
	pub people_on: Vec<MemberId>,
	/// Mentioned or aligned people outside the owner's subtree.
	pub external: Vec<MemberId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlignmentReport {
	pub member_id: MemberId,
	pub objectives: Vec<ObjectiveStats>,
	/// Subordinates working on none of the objectives.
	pub invisible: Vec<MemberId>,
	pub visibility_pct: f64,
	/// Distinct external people per distinct person on any objective.
	pub leverage_ratio: f64,
	/// Distinct (member, objective) pairs evaluated while walking alignments.
	pub evaluated_pairs: usize,
}

type PairKey = (MemberId, String);

#[derive(Clone, Debug, Default)]
struct Reach {
	people_on: BTreeSet<MemberId>,
	leveraged: BTreeSet<MemberId>,
}

impl OrgService {
	/// `None` when `member_id` is not a member of the live snapshot.
	pub fn alignment(&self, member_id: &str) -> Option<AlignmentReport> {
		let snapshot = self.snapshot();
		let (member_id, entry) = snapshot.member_entry(member_id)?;
		let mut walker = ReachWalker { snapshot: &snapshot, memo: HashMap::new() };
		let mut objectives = Vec::with_capacity(entry.okr.objectives.len());
		let mut on_any = BTreeSet::new();
		let mut external_any = BTreeSet::new();

		for (n, objective) in entry.okr.objectives.iter().enumerate() {
			let reach = walker.reach(member_id, objective);
			let people_on = reach
				.people_on
				.iter()
				.filter(|id| snapshot.member(id.as_str()).is_some())
				.cloned()
				.collect::<Vec<_>>();
			let external = reach
				.leveraged
				.iter()
				.filter(|id| {
					*id != member_id
						&& !snapshot.hierarchy.is_subordinate(member_id.as_str(), id.as_str())
						&& snapshot.member(id.as_str()).is_some()
				})
				.cloned()
				.collect::<Vec<_>>();

			on_any.extend(reach.people_on.iter().cloned());
			external_any.extend(external.iter().cloned());
			objectives.push(ObjectiveStats {
				objective_id: objective.id.clone(),
				label: format!("Obj{}", n + 1),
				people_on,
				external,
			});
		}

		let team = snapshot
			.hierarchy
			.all_subordinates(member_id.as_str())
			.into_iter()
			.filter(|id| snapshot.member(id.as_str()).is_some())
			.collect::<Vec<_>>();
		let invisible = team
			.iter()
			.filter(|id| !on_any.contains(**id))
			.map(|id| (*id).clone())
			.collect::<Vec<_>>();
		let visibility_pct = if team.is_empty() {
			100.0
		} else {
			round_tenth((team.len() - invisible.len()) as f64 * 100.0 / team.len() as f64)
		};
		let leverage_ratio = if on_any.is_empty() {
			0.0
		} else {
			external_any.len() as f64 / on_any.len() as f64
		};

		Some(AlignmentReport {
			member_id: member_id.clone(),
			objectives,
			invisible,
			visibility_pct,
			leverage_ratio,
			evaluated_pairs: walker.memo.len(),
		})
	}
}

/// Walks aligned objectives with an explicit stack, computing each (owner, objective) pair once.
struct ReachWalker<'a> {
	snapshot: &'a OrgSnapshot,
	memo: HashMap<PairKey, Reach>,
}
impl<'a> ReachWalker<'a> {
	fn reach(&mut self, owner: &MemberId, objective: &Objective) -> Reach {
		let root = (owner.clone(), objective.id.clone());

		if let Some(done) = self.memo.get(&root) {
			return done.clone();
		}

		let mut stack = vec![(root.clone(), false)];
		let mut open = HashSet::new();

		while let Some((key, expanded)) = stack.pop() {
			if self.memo.contains_key(&key) {
				continue;
			}

			let Some(objective) = self.objective(&key) else {
				self.memo.insert(key, Reach::default());

				continue;
			};

			if expanded {
				open.remove(&key);

				let reach = self.combine(&key.0, objective);

				self.memo.insert(key, reach);

				continue;
			}
			if !open.insert(key.clone()) {
				continue;
			}

			stack.push((key.clone(), true));

			for child in self.subordinate_children(&key.0, objective) {
				if !self.memo.contains_key(&child) && !open.contains(&child) {
					stack.push((child, false));
				}
			}
		}

		self.memo.get(&root).cloned().unwrap_or_default()
	}

	fn combine(&self, owner: &MemberId, objective: &Objective) -> Reach {
		let mut reach = Reach::default();

		reach.people_on.insert(owner.clone());
		reach.leveraged.extend(objective.mentioned_members().into_iter().cloned());

		for aligned in &objective.aligned {
			let key = (aligned.owner.open_id.clone(), aligned.id.clone());
			let Some(child) = self.objective(&key) else { continue };

			if self.snapshot.hierarchy.is_subordinate(owner.as_str(), key.0.as_str()) {
				if let Some(below) = self.memo.get(&key) {
					reach.people_on.extend(below.people_on.iter().cloned());
					reach.leveraged.extend(below.leveraged.iter().cloned());
				}
			} else {
				reach.leveraged.extend(child.mentioned_members().into_iter().cloned());
			}
		}

		reach
	}

	fn subordinate_children(&self, owner: &MemberId, objective: &Objective) -> Vec<PairKey> {
		let hierarchy = &self.snapshot.hierarchy;

		objective
			.aligned
			.iter()
			.filter(|aligned| {
				hierarchy.is_subordinate(owner.as_str(), aligned.owner.open_id.as_str())
			})
			.map(|aligned| (aligned.owner.open_id.clone(), aligned.id.clone()))
			.collect()
	}

	fn objective(&self, key: &PairKey) -> Option<&'a Objective> {
		self.snapshot.member(key.0.as_str())?.okr.objective(&key.1)
	}
}

pub(crate) fn round_tenth(value: f64) -> f64 {
	(value * 10.0).round() / 10.0
}
