//! Key-value cache holding ranked search results and flattened subordinate lists.

use std::{
	collections::{BTreeMap, HashMap},
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Redis-shaped operations the service relies on. Keys hold either a field map or an ordered
/// list; writing one shape over the other replaces the entry.
pub trait CacheStore: Send + Sync {
	fn hget(&self, key: &str, field: &str) -> Option<String>;

	fn hset(&self, key: &str, field: &str, value: String);

	fn rpush(&self, key: &str, values: Vec<String>);

	/// Swaps in `values` as the whole list in one step. An empty list is still stored.
	fn replace_list(&self, key: &str, values: Vec<String>);

	/// Inclusive `start`, exclusive `end`; `None` reads to the end of the list.
	fn lrange(&self, key: &str, start: usize, end: Option<usize>) -> Vec<String>;

	fn exists(&self, key: &str) -> bool;

	/// Returns whether the key existed.
	fn delete(&self, key: &str) -> bool;

	/// Keys starting with `prefix`, sorted.
	fn scan_prefix(&self, prefix: &str) -> Vec<String>;
}

#[derive(Clone, Debug)]
enum Entry {
	Fields(HashMap<String, String>),
	List(Vec<String>),
}

#[derive(Debug, Default)]
pub struct MemoryCache {
	entries: RwLock<BTreeMap<String, Entry>>,
}
impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().is_empty()
	}

	fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Entry>> {
		self.entries.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Entry>> {
		self.entries.write().unwrap_or_else(|err| err.into_inner())
	}
}
impl CacheStore for MemoryCache {
	fn hget(&self, key: &str, field: &str) -> Option<String> {
		match self.read().get(key) {
			Some(Entry::Fields(fields)) => fields.get(field).cloned(),
			_ => None,
		}
	}

	fn hset(&self, key: &str, field: &str, value: String) {
		let mut entries = self.write();
		let entry = entries.entry(key.to_string()).or_insert_with(|| Entry::Fields(HashMap::new()));

		if let Entry::List(_) = entry {
			*entry = Entry::Fields(HashMap::new());
		}
		if let Entry::Fields(fields) = entry {
			fields.insert(field.to_string(), value);
		}
	}

	fn rpush(&self, key: &str, values: Vec<String>) {
		let mut entries = self.write();
		let entry = entries.entry(key.to_string()).or_insert_with(|| Entry::List(Vec::new()));

		if let Entry::Fields(_) = entry {
			*entry = Entry::List(Vec::new());
		}
		if let Entry::List(list) = entry {
			list.extend(values);
		}
	}

	fn replace_list(&self, key: &str, values: Vec<String>) {
		self.write().insert(key.to_string(), Entry::List(values));
	}

	fn lrange(&self, key: &str, start: usize, end: Option<usize>) -> Vec<String> {
		match self.read().get(key) {
			Some(Entry::List(list)) => {
				let end = end.unwrap_or(list.len()).min(list.len());

				list.get(start..end).map(<[String]>::to_vec).unwrap_or_default()
			},
			_ => Vec::new(),
		}
	}

	fn exists(&self, key: &str) -> bool {
		self.read().contains_key(key)
	}

	fn delete(&self, key: &str) -> bool {
		self.write().remove(key).is_some()
	}

	fn scan_prefix(&self, prefix: &str) -> Vec<String> {
		self.read()
			.range(prefix.to_string()..)
			.take_while(|(key, _)| key.starts_with(prefix))
			.map(|(key, _)| key.clone())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lists_and_fields_round_out() {
		let cache = MemoryCache::new();

		cache.rpush("search:plan", vec!["a".into(), "b".into()]);
		cache.rpush("search:plan", vec!["c".into()]);
		cache.hset("high_recommend:plan", "count", "2".into());

		assert_eq!(cache.lrange("search:plan", 1, None), vec!["b".to_string(), "c".into()]);
		assert_eq!(cache.lrange("search:plan", 2, Some(10)), vec!["c".to_string()]);
		assert!(cache.lrange("search:plan", 5, None).is_empty());
		assert_eq!(cache.hget("high_recommend:plan", "count").as_deref(), Some("2"));
		assert_eq!(cache.hget("search:plan", "count"), None);
	}

	#[test]
	fn replacing_a_list_keeps_empty_entries() {
		let cache = MemoryCache::new();

		cache.rpush("search:plan", vec!["a".into(), "b".into()]);
		cache.replace_list("search:plan", vec!["c".into()]);

		assert_eq!(cache.lrange("search:plan", 0, None), vec!["c".to_string()]);

		cache.replace_list("search:plan", Vec::new());

		assert!(cache.exists("search:plan"));
		assert!(cache.lrange("search:plan", 0, None).is_empty());
	}

	#[test]
	fn prefix_scan_is_bounded() {
		let cache = MemoryCache::new();

		for key in ["search:a", "search:b", "searching", "subordinates:all:x"] {
			cache.rpush(key, vec!["v".into()]);
		}

		assert_eq!(cache.scan_prefix("search:"), vec!["search:a".to_string(), "search:b".into()]);
		assert!(cache.delete("search:a"));
		assert!(!cache.delete("search:a"));
		assert_eq!(cache.len(), 3);
	}
}
