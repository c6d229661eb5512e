//! OKR health roll-up per team. A member counts as healthy when they own at least one objective
//! and every objective carries key results.

use std::iter;

use serde::Serialize;

use orgscope_domain::MemberId;

use crate::{OrgService, OrgSnapshot, alignment::round_tenth};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamHealth {
	pub leader: MemberId,
	pub leader_name: String,
	/// The leader plus everyone below them.
	pub member_count: usize,
	pub healthy_count: usize,
	pub healthy_pct: f64,
	pub unhealthy: Vec<MemberId>,
}

impl OrgService {
	/// One roll-up per direct report of `member_id`, each covering that report's whole team.
	/// `None` when `member_id` is not a member of the live snapshot.
	pub fn team_health(&self, member_id: &str) -> Option<Vec<TeamHealth>> {
		let snapshot = self.snapshot();

		snapshot.member(member_id)?;

		Some(
			snapshot
				.hierarchy
				.direct_subordinates(member_id)
				.into_iter()
				.filter_map(|leader| team_health(&snapshot, leader))
				.collect(),
		)
	}
}

fn team_health(snapshot: &OrgSnapshot, leader: &MemberId) -> Option<TeamHealth> {
	let head = snapshot.member(leader.as_str())?;
	let team = iter::once(leader)
		.chain(snapshot.hierarchy.all_subordinates(leader.as_str()))
		.filter_map(|id| snapshot.member(id.as_str()).map(|entry| (id, entry)))
		.collect::<Vec<_>>();
	let unhealthy = team
		.iter()
		.filter(|(_, entry)| !entry.okr.health().is_healthy())
		.map(|(id, _)| (*id).clone())
		.collect::<Vec<_>>();
	let healthy_count = team.len() - unhealthy.len();

	Some(TeamHealth {
		leader: leader.clone(),
		leader_name: head.profile.name.clone(),
		member_count: team.len(),
		healthy_count,
		healthy_pct: round_tenth(healthy_count as f64 * 100.0 / team.len() as f64),
		unhealthy,
	})
}
