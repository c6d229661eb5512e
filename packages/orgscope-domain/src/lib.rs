pub mod hierarchy;
pub mod highlight;
pub mod member;
pub mod okr;
pub mod phrase;
pub mod tokenize;

mod error;

pub use error::{ContentError, StructuralError};
pub use member::{MemberId, MemberProfile, MemberRecord};
