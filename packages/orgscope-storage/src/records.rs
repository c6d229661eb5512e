use std::{future::Future, pin::Pin};

use time::OffsetDateTime;

use crate::{
	Result,
	models::{SearchStat, SubscriptionRecord},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of removing one subscriber from a watched phrase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
	Removed,
	/// The last subscriber left and the record was deleted.
	RemovedLast,
	NotSubscribed,
	UnknownKeyword,
}

/// Durable bookkeeping for subscriptions and search analytics.
pub trait RecordStore: Send + Sync {
	fn get_subscription<'a>(
		&'a self,
		keyword: &'a str,
	) -> BoxFuture<'a, Result<Option<SubscriptionRecord>>>;

	/// Adds `subscriber` to `keyword`, creating the record with `member_ids` as its last known
	/// result when it does not exist. Returns `false` when the subscriber was already present.
	fn add_subscriber<'a>(
		&'a self,
		keyword: &'a str,
		subscriber: &'a str,
		member_ids: &'a [String],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>>;

	/// Removes `subscriber` from `keyword`, deleting the record once nobody is left.
	fn remove_subscriber<'a>(
		&'a self,
		keyword: &'a str,
		subscriber: &'a str,
	) -> BoxFuture<'a, Result<Removal>>;

	/// All records, ordered by keyword.
	fn list_subscriptions(&self) -> BoxFuture<'_, Result<Vec<SubscriptionRecord>>>;

	fn subscriptions_for<'a>(
		&'a self,
		subscriber: &'a str,
	) -> BoxFuture<'a, Result<Vec<SubscriptionRecord>>>;

	/// Replaces the last known result of each listed keyword in a single transaction. Keywords
	/// deleted in the meantime are skipped.
	fn commit_results<'a>(
		&'a self,
		results: &'a [(String, Vec<String>)],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;

	fn record_search<'a>(
		&'a self,
		fragment: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;

	/// Most frequent fragments first; ties by fragment.
	fn top_searches(&self, limit: u32) -> BoxFuture<'_, Result<Vec<SearchStat>>>;
}

pub(crate) fn require_non_empty(label: &str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(crate::Error::InvalidArgument(format!("{label} must be non-empty.")));
	}

	Ok(())
}
