use std::{
	collections::{BTreeMap, HashMap},
	sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;

use crate::{
	Result,
	models::{SearchStat, SubscriptionRecord},
	records::{self, BoxFuture, RecordStore, Removal},
};

/// In-process [`RecordStore`] for tests and single-node deployments without Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
	state: Mutex<State>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl RecordStore for MemoryStore {
	fn get_subscription<'a>(
		&'a self,
		keyword: &'a str,
	) -> BoxFuture<'a, Result<Option<SubscriptionRecord>>> {
		let record = self.state().subscriptions.get(keyword).cloned();

		Box::pin(async move { Ok(record) })
	}

	fn add_subscriber<'a>(
		&'a self,
		keyword: &'a str,
		subscriber: &'a str,
		member_ids: &'a [String],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>> {
		let result = records::require_non_empty("keyword", keyword)
			.and_then(|()| records::require_non_empty("subscriber", subscriber))
			.map(|()| self.state().add_subscriber(keyword, subscriber, member_ids, now));

		Box::pin(async move { result })
	}

	fn remove_subscriber<'a>(
		&'a self,
		keyword: &'a str,
		subscriber: &'a str,
	) -> BoxFuture<'a, Result<Removal>> {
		let removal = self.state().remove_subscriber(keyword, subscriber);

		Box::pin(async move { Ok(removal) })
	}

	fn list_subscriptions(&self) -> BoxFuture<'_, Result<Vec<SubscriptionRecord>>> {
		let records = self.state().subscriptions.values().cloned().collect();

		Box::pin(async move { Ok(records) })
	}

	fn subscriptions_for<'a>(
		&'a self,
		subscriber: &'a str,
	) -> BoxFuture<'a, Result<Vec<SubscriptionRecord>>> {
		let records = self
			.state()
			.subscriptions
			.values()
			.filter(|record| record.subscribers.iter().any(|existing| existing == subscriber))
			.cloned()
			.collect();

		Box::pin(async move { Ok(records) })
	}

	fn commit_results<'a>(
		&'a self,
		results: &'a [(String, Vec<String>)],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		let mut state = self.state();

		for (keyword, member_ids) in results {
			if let Some(record) = state.subscriptions.get_mut(keyword) {
				record.member_ids = member_ids.clone();
				record.updated_at = now;
			}
		}

		drop(state);

		Box::pin(async move { Ok(()) })
	}

	fn record_search<'a>(
		&'a self,
		fragment: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		let result = records::require_non_empty("fragment", fragment).map(|()| {
			let mut state = self.state();
			let stat = state.searches.entry(fragment.to_string()).or_insert_with(|| SearchStat {
				fragment: fragment.to_string(),
				freq: 0,
				last_searched_at: now,
			});

			stat.freq += 1;
			stat.last_searched_at = now;
		});

		Box::pin(async move { result })
	}

	fn top_searches(&self, limit: u32) -> BoxFuture<'_, Result<Vec<SearchStat>>> {
		let mut stats = self.state().searches.values().cloned().collect::<Vec<_>>();

		stats.sort_by(|a, b| b.freq.cmp(&a.freq).then_with(|| a.fragment.cmp(&b.fragment)));
		stats.truncate(limit as usize);

		Box::pin(async move { Ok(stats) })
	}
}

#[derive(Debug, Default)]
struct State {
	subscriptions: BTreeMap<String, SubscriptionRecord>,
	searches: HashMap<String, SearchStat>,
}
impl State {
	fn add_subscriber(
		&mut self,
		keyword: &str,
		subscriber: &str,
		member_ids: &[String],
		now: OffsetDateTime,
	) -> bool {
		let record =
			self.subscriptions.entry(keyword.to_string()).or_insert_with(|| SubscriptionRecord {
				keyword: keyword.to_string(),
				subscribers: Vec::new(),
				member_ids: member_ids.to_vec(),
				updated_at: now,
			});

		if record.subscribers.iter().any(|existing| existing == subscriber) {
			return false;
		}

		record.subscribers.push(subscriber.to_string());
		record.updated_at = now;

		true
	}

	fn remove_subscriber(&mut self, keyword: &str, subscriber: &str) -> Removal {
		let Some(record) = self.subscriptions.get_mut(keyword) else {
			return Removal::UnknownKeyword;
		};
		let Some(pos) = record.subscribers.iter().position(|existing| existing == subscriber)
		else {
			return Removal::NotSubscribed;
		};

		record.subscribers.remove(pos);

		if record.subscribers.is_empty() {
			self.subscriptions.remove(keyword);

			return Removal::RemovedLast;
		}

		Removal::Removed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn block_on<F: std::future::Future>(future: F) -> F::Output {
		tokio::runtime::Builder::new_current_thread()
			.build()
			.expect("Failed to build runtime.")
			.block_on(future)
	}

	#[test]
	fn subscriber_lifecycle() {
		let store = MemoryStore::new();
		let now = OffsetDateTime::UNIX_EPOCH;
		let ids = vec!["ou_1".to_string()];

		assert!(block_on(store.add_subscriber("launch", "ou_a", &ids, now)).expect("add"));
		assert!(!block_on(store.add_subscriber("launch", "ou_a", &[], now)).expect("add"));
		assert!(block_on(store.add_subscriber("launch", "ou_b", &[], now)).expect("add"));

		let record = block_on(store.get_subscription("launch")).expect("get").expect("record");

		assert_eq!(record.member_ids, ids);
		assert_eq!(record.subscribers, vec!["ou_a".to_string(), "ou_b".into()]);

		let remove = |subscriber: &str| {
			block_on(store.remove_subscriber("launch", subscriber)).expect("Failed to remove.")
		};

		assert_eq!(remove("ou_c"), Removal::NotSubscribed);
		assert_eq!(remove("ou_a"), Removal::Removed);
		assert_eq!(remove("ou_b"), Removal::RemovedLast);
		assert_eq!(remove("ou_b"), Removal::UnknownKeyword);
	}

	#[test]
	fn empty_keyword_is_rejected() {
		let store = MemoryStore::new();
		let result = block_on(store.add_subscriber(" ", "ou_a", &[], OffsetDateTime::UNIX_EPOCH));

		assert!(matches!(result, Err(crate::Error::InvalidArgument(_))));
	}
}
