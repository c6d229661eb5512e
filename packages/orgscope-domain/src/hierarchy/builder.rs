use std::collections::{HashMap, HashSet};

use super::{HierarchyBuild, HierarchyIndex, MemberNode};
use crate::{MemberId, MemberRecord, StructuralError};

pub(super) fn build<'a, I>(records: I) -> HierarchyBuild
where
	I: IntoIterator<Item = &'a MemberRecord>,
{
	let mut rejected = Vec::new();
	let accepted = resolve_managers(records, &mut rejected);
	let managers: HashMap<&MemberId, Option<&MemberId>> =
		accepted.iter().map(|record| (&record.id, record.manager_id.as_ref())).collect();
	let mut index = HierarchyIndex::default();

	for record in accepted {
		if let Err(err) = insert(&mut index, &managers, record) {
			rejected.push(err);
		}
	}

	close(&mut index);

	HierarchyBuild { index, rejected }
}

/// Keeps the first record seen per id. A repeat that names a different manager would give the
/// member two parents and is rejected; an exact repeat is ignored.
fn resolve_managers<'a, I>(records: I, rejected: &mut Vec<StructuralError>) -> Vec<&'a MemberRecord>
where
	I: IntoIterator<Item = &'a MemberRecord>,
{
	let mut seen: HashMap<&MemberId, Option<&MemberId>> = HashMap::new();
	let mut accepted = Vec::new();

	for record in records {
		if record.manager_id.as_ref() == Some(&record.id) {
			rejected.push(StructuralError::SelfManaged { member_id: record.id.clone() });

			continue;
		}

		match seen.get(&record.id) {
			None => {
				seen.insert(&record.id, record.manager_id.as_ref());
				accepted.push(record);
			},
			Some(manager) if *manager == record.manager_id.as_ref() => {},
			Some(_) => {
				rejected.push(StructuralError::MultiParent { member_id: record.id.clone() });
			},
		}
	}

	accepted
}

fn insert(
	index: &mut HierarchyIndex,
	managers: &HashMap<&MemberId, Option<&MemberId>>,
	record: &MemberRecord,
) -> Result<(), StructuralError> {
	// A placeholder was already placed by an earlier chain walk; only its attributes are missing.
	if let Some(&idx) = index.by_id.get(&record.id) {
		index.nodes[idx].profile = Some(record.profile.clone());

		return Ok(());
	}

	let mut path = vec![&record.id];
	let mut on_path: HashSet<&MemberId> = HashSet::from([&record.id]);
	let mut next = record.manager_id.as_ref();
	let attach = loop {
		let Some(manager) = next else { break None };

		if let Some(&idx) = index.by_id.get(manager) {
			break Some(idx);
		}
		if !on_path.insert(manager) {
			return Err(StructuralError::Cycle {
				member_id: record.id.clone(),
				revisited: manager.clone(),
			});
		}

		path.push(manager);

		next = managers.get(manager).copied().flatten();
	};

	// Materialize top-down so each node links under an already placed parent.
	let mut parent = attach;

	for (depth, id) in path.iter().enumerate().rev() {
		let manager_id = managers.get(*id).copied().flatten().cloned();
		let profile = (depth == 0).then(|| record.profile.clone());
		let idx = index.nodes.len();
		let mut node = MemberNode::new((*id).clone(), manager_id, profile);

		node.parent = parent;

		match parent {
			Some(parent) => index.nodes[parent].children.push(idx),
			None => index.roots.push(idx),
		}

		index.nodes.push(node);
		index.by_id.insert((*id).clone(), idx);

		parent = Some(idx);
	}

	Ok(())
}

/// Fills each node's flattened descendant list bottom-up and stamps pre-order intervals.
fn close(index: &mut HierarchyIndex) {
	let mut clock = 0;
	let mut stack = Vec::new();

	for root_pos in 0..index.roots.len() {
		stack.push((index.roots[root_pos], false));

		while let Some((idx, expanded)) = stack.pop() {
			if expanded {
				let node = &index.nodes[idx];
				let mut descendants = node.children.clone();

				for &child in &node.children {
					descendants.extend_from_slice(&index.nodes[child].descendants);
				}

				let node = &mut index.nodes[idx];

				node.descendants = descendants;
				node.exit = clock;

				continue;
			}

			clock += 1;
			index.nodes[idx].enter = clock;

			stack.push((idx, true));
			stack.extend(index.nodes[idx].children.iter().rev().map(|&child| (child, false)));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chain_walk_creates_placeholders_once() {
		let records = [
			MemberRecord::new("carl", "Carl").with_manager("bob"),
			MemberRecord::new("dana", "Dana").with_manager("bob"),
			MemberRecord::new("bob", "Bob").with_manager("alice"),
		];
		let HierarchyBuild { index, rejected } = build(&records);

		assert!(rejected.is_empty());
		assert_eq!(index.len(), 4);
		assert!(index.get("alice").is_some_and(MemberNode::is_placeholder));
		assert_eq!(
			index.get("bob").and_then(MemberNode::profile).map(|profile| profile.name.as_str()),
			Some("Bob")
		);
		assert_eq!(index.roots().collect::<Vec<_>>(), vec![&MemberId::from("alice")]);
	}

	#[test]
	fn intervals_nest_within_parents() {
		let records = [
			MemberRecord::new("a", "A"),
			MemberRecord::new("b", "B").with_manager("a"),
			MemberRecord::new("c", "C").with_manager("b"),
			MemberRecord::new("d", "D").with_manager("a"),
		];
		let HierarchyBuild { index, .. } = build(&records);
		let node = |id: &str| index.get(id).cloned().expect("Member must exist.");
		let (a, b, c, d) = (node("a"), node("b"), node("c"), node("d"));

		assert!(a.enter < b.enter && c.exit <= b.exit && b.exit <= a.exit);
		assert!(d.enter > b.exit);
		assert!(c.descendants.is_empty());
	}
}
