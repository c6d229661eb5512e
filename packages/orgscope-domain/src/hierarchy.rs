//! Reporting forest built from flat (member, manager) pairs.
//!
//! Nodes live in an arena addressed by position; an id map gives O(1) lookup. Each node caches its
//! flattened descendant list and a pre-order interval, so subtree membership checks never walk
//! the manager chain.

mod builder;

use std::collections::HashMap;

use crate::{MemberId, MemberProfile, MemberRecord, StructuralError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberNode {
	id: MemberId,
	manager_id: Option<MemberId>,
	/// `None` for a placeholder synthesized from a manager reference with no record yet.
	profile: Option<MemberProfile>,
	parent: Option<usize>,
	children: Vec<usize>,
	descendants: Vec<usize>,
	enter: usize,
	exit: usize,
}
impl MemberNode {
	fn new(id: MemberId, manager_id: Option<MemberId>, profile: Option<MemberProfile>) -> Self {
		Self {
			id,
			manager_id,
			profile,
			parent: None,
			children: Vec::new(),
			descendants: Vec::new(),
			enter: 0,
			exit: 0,
		}
	}

	pub fn id(&self) -> &MemberId {
		&self.id
	}

	pub fn manager_id(&self) -> Option<&MemberId> {
		self.manager_id.as_ref()
	}

	pub fn profile(&self) -> Option<&MemberProfile> {
		self.profile.as_ref()
	}

	pub fn is_placeholder(&self) -> bool {
		self.profile.is_none()
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}
}

/// Result of one build: the index plus every record rejected on the way.
#[derive(Debug)]
pub struct HierarchyBuild {
	pub index: HierarchyIndex,
	pub rejected: Vec<StructuralError>,
}

/// Read-only view over a completed forest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyIndex {
	nodes: Vec<MemberNode>,
	by_id: HashMap<MemberId, usize>,
	roots: Vec<usize>,
}
impl HierarchyIndex {
	pub fn build<'a, I>(records: I) -> HierarchyBuild
	where
		I: IntoIterator<Item = &'a MemberRecord>,
	{
		builder::build(records)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.by_id.contains_key(id)
	}

	pub fn get(&self, id: &str) -> Option<&MemberNode> {
		self.by_id.get(id).map(|&idx| &self.nodes[idx])
	}

	/// Members in construction order, placeholders included.
	pub fn members(&self) -> impl Iterator<Item = &MemberNode> {
		self.nodes.iter()
	}

	pub fn roots(&self) -> impl Iterator<Item = &MemberId> {
		self.roots.iter().map(|&idx| &self.nodes[idx].id)
	}

	/// Immediate children in insertion order. Unknown ids yield an empty list.
	pub fn direct_subordinates(&self, id: &str) -> Vec<&MemberId> {
		self.ids_of(id, |node| &node.children)
	}

	/// Transitive closure below `id`: direct reports first, then each report's subtree in turn.
	/// The list is duplicate-free and empty for leaves and unknown ids.
	pub fn all_subordinates(&self, id: &str) -> Vec<&MemberId> {
		self.ids_of(id, |node| &node.descendants)
	}

	/// True when `ancestor` appears on `candidate`'s manager chain. A member is never its own
	/// subordinate.
	pub fn is_subordinate(&self, ancestor: &str, candidate: &str) -> bool {
		if candidate.is_empty() {
			return false;
		}

		let (Some(&a), Some(&c)) = (self.by_id.get(ancestor), self.by_id.get(candidate)) else {
			return false;
		};
		let (a, c) = (&self.nodes[a], &self.nodes[c]);

		a.enter < c.enter && c.enter <= a.exit
	}

	/// Walks from `id`'s manager up to its root. Empty for roots and unknown ids.
	pub fn manager_chain(&self, id: &str) -> ManagerChain<'_> {
		let next = self.by_id.get(id).and_then(|&idx| self.nodes[idx].parent);

		ManagerChain { index: self, next }
	}

	fn ids_of<F>(&self, id: &str, select: F) -> Vec<&MemberId>
	where
		F: Fn(&MemberNode) -> &Vec<usize>,
	{
		let Some(&idx) = self.by_id.get(id) else { return Vec::new() };

		select(&self.nodes[idx]).iter().map(|&child| &self.nodes[child].id).collect()
	}
}

pub struct ManagerChain<'a> {
	index: &'a HierarchyIndex,
	next: Option<usize>,
}
impl<'a> Iterator for ManagerChain<'a> {
	type Item = &'a MemberId;

	fn next(&mut self) -> Option<Self::Item> {
		let node = &self.index.nodes[self.next?];

		self.next = node.parent;

		Some(&node.id)
	}
}
