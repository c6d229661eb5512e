use time::OffsetDateTime;

/// A watched phrase with its subscribers and the member ids last delivered for it.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct SubscriptionRecord {
	pub keyword: String,
	pub subscribers: Vec<String>,
	pub member_ids: Vec<String>,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct SearchStat {
	pub fragment: String,
	pub freq: i64,
	pub last_searched_at: OffsetDateTime,
}
