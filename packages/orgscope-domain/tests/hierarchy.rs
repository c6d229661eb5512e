use std::collections::{BTreeSet, HashSet};

use orgscope_domain::{
	MemberId, MemberRecord, StructuralError,
	hierarchy::{HierarchyBuild, HierarchyIndex},
};

fn ids(values: &[&str]) -> Vec<MemberId> {
	values.iter().copied().map(MemberId::from).collect()
}

fn owned(values: Vec<&MemberId>) -> Vec<MemberId> {
	values.into_iter().cloned().collect()
}

fn build(records: &[MemberRecord]) -> HierarchyBuild {
	HierarchyIndex::build(records)
}

/// Deterministic acyclic forest: member `i` reports to some `j < i` or to nobody. Records are
/// emitted in a scrambled order so chains arrive before their managers.
fn generated_forest(n: usize, seed: u64) -> Vec<MemberRecord> {
	let mut state = seed;
	let mut next = || {
		state =
			state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);

		(state >> 33) as usize
	};
	let mut records = (0..n)
		.map(|i| {
			let record = MemberRecord::new(format!("m{i}"), format!("Member {i}"));

			match i {
				0 => record,
				_ if next() % 7 == 0 => record,
				_ => record.with_manager(format!("m{}", next() % i)),
			}
		})
		.collect::<Vec<_>>();

	for i in (1..records.len()).rev() {
		records.swap(i, next() % (i + 1));
	}

	records
}

#[test]
fn scenario_alice_bob_carl() {
	let records = [
		MemberRecord::new("alice", "Alice"),
		MemberRecord::new("bob", "Bob").with_manager("alice"),
		MemberRecord::new("carl", "Carl").with_manager("bob"),
	];
	let HierarchyBuild { index, rejected } = build(&records);

	assert!(rejected.is_empty());
	assert_eq!(owned(index.direct_subordinates("alice")), ids(&["bob"]));
	assert_eq!(owned(index.all_subordinates("alice")), ids(&["bob", "carl"]));
	assert!(index.is_subordinate("alice", "carl"));
	assert!(!index.is_subordinate("bob", "alice"));
	assert!(index.all_subordinates("carl").is_empty());
}

#[test]
fn acyclic_input_places_every_member_under_one_root() {
	let records = generated_forest(300, 7);
	let HierarchyBuild { index, rejected } = build(&records);

	assert!(rejected.is_empty());
	assert_eq!(index.len(), 300);

	let mut reached = HashSet::new();

	for root in index.roots() {
		assert!(reached.insert(root.clone()), "Root {root} reached twice.");

		for id in index.all_subordinates(root.as_str()) {
			assert!(reached.insert(id.clone()), "Member {id} reached from two roots.");
		}
	}

	assert_eq!(reached.len(), 300);
}

#[test]
fn rebuilding_identical_input_is_idempotent() {
	let records = generated_forest(120, 42);
	let first = build(&records);
	let second = build(&records);

	assert_eq!(first.index, second.index);
	assert_eq!(first.rejected, second.rejected);
}

#[test]
fn closure_matches_transitive_direct_subordinates() {
	let records = generated_forest(200, 3);
	let HierarchyBuild { index, .. } = build(&records);

	for node in index.members() {
		let mut expected = BTreeSet::new();
		let mut frontier = vec![node.id().clone()];

		while let Some(id) = frontier.pop() {
			for child in index.direct_subordinates(id.as_str()) {
				if expected.insert(child.clone()) {
					frontier.push(child.clone());
				}
			}
		}

		let closure = owned(index.all_subordinates(node.id().as_str()));

		assert_eq!(closure.len(), expected.len(), "Closure of {} has duplicates.", node.id());
		assert_eq!(closure.into_iter().collect::<BTreeSet<_>>(), expected);
		assert_eq!(node.is_leaf(), expected.is_empty());
	}
}

#[test]
fn subordinate_check_agrees_with_manager_chain() {
	let records = generated_forest(80, 11);
	let HierarchyBuild { index, .. } = build(&records);
	let members = index.members().map(|node| node.id().clone()).collect::<Vec<_>>();

	for a in &members {
		for b in &members {
			let walked = index.manager_chain(b.as_str()).any(|hop| hop == a);

			assert_eq!(index.is_subordinate(a.as_str(), b.as_str()), walked, "a={a} b={b}");
		}

		assert!(!index.is_subordinate(a.as_str(), a.as_str()));
		assert!(!index.is_subordinate(a.as_str(), ""));
	}
}

#[test]
fn placeholder_is_reused_when_real_record_arrives() {
	let records = [
		MemberRecord::new("carl", "Carl").with_manager("bob"),
		MemberRecord::new("bob", "Bob").with_manager("alice"),
		MemberRecord::new("alice", "Alice"),
	];
	let HierarchyBuild { index, rejected } = build(&records);

	assert!(rejected.is_empty());
	assert_eq!(index.len(), 3);
	assert_eq!(index.roots().cloned().collect::<Vec<_>>(), ids(&["alice"]));

	let alice = index.get("alice").expect("Alice must exist.");

	assert!(!alice.is_placeholder());
	assert_eq!(alice.profile().map(|profile| profile.name.as_str()), Some("Alice"));
	assert_eq!(owned(index.manager_chain("carl").collect()), ids(&["bob", "alice"]));
}

#[test]
fn unresolved_manager_becomes_placeholder_root() {
	let records = [MemberRecord::new("bob", "Bob").with_manager("ghost")];
	let HierarchyBuild { index, .. } = build(&records);

	assert!(index.get("ghost").is_some_and(|node| node.is_placeholder()));
	assert!(index.is_subordinate("ghost", "bob"));
}

#[test]
fn malformed_records_are_rejected_without_failing_the_batch() {
	let records = [
		MemberRecord::new("root", "Root"),
		MemberRecord::new("selfish", "Selfish").with_manager("selfish"),
		MemberRecord::new("x", "X").with_manager("y"),
		MemberRecord::new("y", "Y").with_manager("x"),
		MemberRecord::new("twin", "Twin").with_manager("root"),
		MemberRecord::new("twin", "Twin").with_manager("x"),
		MemberRecord::new("ok", "Ok").with_manager("root"),
	];
	let HierarchyBuild { index, rejected } = build(&records);

	assert_eq!(
		rejected,
		vec![
			StructuralError::SelfManaged { member_id: "selfish".into() },
			StructuralError::MultiParent { member_id: "twin".into() },
			StructuralError::Cycle { member_id: "x".into(), revisited: "x".into() },
			StructuralError::Cycle { member_id: "y".into(), revisited: "y".into() },
		]
	);
	assert_eq!(owned(index.direct_subordinates("root")), ids(&["twin", "ok"]));
	assert!(!index.contains("x"));
	assert!(!index.contains("selfish"));
}

#[test]
fn unknown_ids_yield_empty_results() {
	let HierarchyBuild { index, .. } = build(&[MemberRecord::new("solo", "Solo")]);

	assert!(index.direct_subordinates("nobody").is_empty());
	assert!(index.all_subordinates("nobody").is_empty());
	assert!(!index.is_subordinate("nobody", "solo"));
	assert_eq!(index.manager_chain("nobody").count(), 0);
}
