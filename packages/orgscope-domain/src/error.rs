use crate::MemberId;

/// A directory record that cannot be placed in the forest. The record is skipped; the rest of the
/// batch is unaffected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
	#[error("Member {member_id} names itself as its own manager.")]
	SelfManaged { member_id: MemberId },
	#[error("Manager chain of member {member_id} revisits member {revisited}.")]
	Cycle { member_id: MemberId, revisited: MemberId },
	#[error("Member {member_id} appears more than once with different managers.")]
	MultiParent { member_id: MemberId },
}
impl StructuralError {
	pub fn member_id(&self) -> &MemberId {
		match self {
			Self::SelfManaged { member_id }
			| Self::Cycle { member_id, .. }
			| Self::MultiParent { member_id } => member_id,
		}
	}
}

/// Content that contributes no tokens.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
	#[error("Content is not a valid OKR document.")]
	Decode(#[from] serde_json::Error),
	#[error("Tokenizer failed: {message}")]
	Tokenizer { message: String },
}
