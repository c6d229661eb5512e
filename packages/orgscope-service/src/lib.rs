pub mod alignment;
pub mod analytics;
pub mod health;
pub mod notify;
pub mod rebuild;
pub mod search;
pub mod snapshot;
pub mod subscription;

mod error;
mod ranking;

use std::{
	collections::{BTreeSet, HashSet},
	sync::{
		Arc, Mutex, MutexGuard, RwLock,
		atomic::{AtomicBool, Ordering},
	},
};

use arc_swap::ArcSwap;
use serde_json::Value;

pub use alignment::{AlignmentReport, ObjectiveStats};
pub use analytics::KeywordStat;
pub use error::{Error, Result};
pub use health::TeamHealth;
pub use notify::{NotifyCycle, NotifyReport, PhraseOutcome, PhraseState};
pub use orgscope_storage::BoxFuture;
pub use ranking::Ranking;
pub use rebuild::RebuildReport;
pub use search::{SearchItem, SearchResponse};
pub use snapshot::OrgSnapshot;
pub use subscription::{SubscribeOutcome, SubscriptionSummary, UnsubscribeOutcome};

use orgscope_config::{Config, DirectoryProviderConfig, NotifyProviderConfig};
use orgscope_domain::{ContentError, MemberId, MemberRecord, tokenize};
use orgscope_providers::{directory, notify as notify_provider};
use orgscope_storage::{CacheStore, RecordStore};

/// Text to normalized token set. Implementations must be pure.
pub trait Tokenizer
where
	Self: Send + Sync,
{
	fn tokenize(&self, text: &str) -> Result<BTreeSet<String>, ContentError>;
}

pub trait DirectorySource
where
	Self: Send + Sync,
{
	fn fetch_members<'a>(
		&'a self,
		cfg: &'a DirectoryProviderConfig,
	) -> BoxFuture<'a, color_eyre::Result<Vec<MemberRecord>>>;
}

pub trait NotifyChannel
where
	Self: Send + Sync,
{
	fn send<'a>(
		&'a self,
		cfg: &'a NotifyProviderConfig,
		recipient: &'a str,
		content: &'a Value,
	) -> BoxFuture<'a, color_eyre::Result<()>>;
}

/// Word segmentation with a configured stop-word list.
pub struct SegmentTokenizer {
	stop_words: HashSet<String>,
}
impl SegmentTokenizer {
	pub fn new<I>(stop_words: I) -> Self
	where
		I: IntoIterator<Item = String>,
	{
		Self { stop_words: stop_words.into_iter().collect() }
	}
}
impl Tokenizer for SegmentTokenizer {
	fn tokenize(&self, text: &str) -> Result<BTreeSet<String>, ContentError> {
		Ok(tokenize::segment(text, &self.stop_words))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub tokenizer: Arc<dyn Tokenizer>,
	pub directory: Arc<dyn DirectorySource>,
	pub notify: Arc<dyn NotifyChannel>,
}
impl Providers {
	pub fn new(
		tokenizer: Arc<dyn Tokenizer>,
		directory: Arc<dyn DirectorySource>,
		notify: Arc<dyn NotifyChannel>,
	) -> Self {
		Self { tokenizer, directory, notify }
	}

	/// HTTP collaborators with a segmenting tokenizer over the configured stop words.
	pub fn from_config(cfg: &orgscope_config::Tokenizer) -> Self {
		let http = Arc::new(HttpProviders);

		Self {
			tokenizer: Arc::new(SegmentTokenizer::new(cfg.stop_words.iter().cloned())),
			directory: http.clone(),
			notify: http,
		}
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self::from_config(&orgscope_config::Tokenizer::default())
	}
}

/// Owns the live index and every operation over it: build, swap, query, notify.
pub struct OrgService {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub cache: Arc<dyn CacheStore>,
	pub providers: Providers,
	live: ArcSwap<OrgSnapshot>,
	published: AtomicBool,
	// Ranking computes and caches under the read side; a rebuild swaps and purges under the write
	// side, so no result ranked on a replaced snapshot can land in the cache after its purge.
	cache_gate: RwLock<()>,
	rebuild_guard: Mutex<()>,
	notify_guard: tokio::sync::Mutex<()>,
}
impl OrgService {
	pub fn new(cfg: Config, store: Arc<dyn RecordStore>, cache: Arc<dyn CacheStore>) -> Self {
		let providers = Providers::from_config(&cfg.tokenizer);

		Self::with_providers(cfg, store, cache, providers)
	}

	pub fn with_providers(
		cfg: Config,
		store: Arc<dyn RecordStore>,
		cache: Arc<dyn CacheStore>,
		providers: Providers,
	) -> Self {
		Self {
			cfg,
			store,
			cache,
			providers,
			live: ArcSwap::from_pointee(OrgSnapshot::default()),
			published: AtomicBool::new(false),
			cache_gate: RwLock::new(()),
			rebuild_guard: Mutex::new(()),
			notify_guard: tokio::sync::Mutex::new(()),
		}
	}

	/// The currently published snapshot. Holders keep a consistent view across a later swap.
	pub fn snapshot(&self) -> Arc<OrgSnapshot> {
		self.live.load_full()
	}

	/// Whether any rebuild has published a snapshot yet. Before that the live snapshot is empty.
	pub fn is_published(&self) -> bool {
		self.published.load(Ordering::Acquire)
	}

	pub fn direct_subordinates(&self, id: &str) -> Vec<MemberId> {
		self.live.load().hierarchy.direct_subordinates(id).into_iter().cloned().collect()
	}

	pub fn all_subordinates(&self, id: &str) -> Vec<MemberId> {
		self.live.load().hierarchy.all_subordinates(id).into_iter().cloned().collect()
	}

	pub fn is_subordinate(&self, ancestor: &str, candidate: &str) -> bool {
		self.live.load().hierarchy.is_subordinate(ancestor, candidate)
	}

	fn lock_rebuild(&self) -> MutexGuard<'_, ()> {
		self.rebuild_guard.lock().unwrap_or_else(|err| err.into_inner())
	}
}

struct HttpProviders;
impl DirectorySource for HttpProviders {
	fn fetch_members<'a>(
		&'a self,
		cfg: &'a DirectoryProviderConfig,
	) -> BoxFuture<'a, color_eyre::Result<Vec<MemberRecord>>> {
		Box::pin(directory::fetch_members(cfg))
	}
}

impl NotifyChannel for HttpProviders {
	fn send<'a>(
		&'a self,
		cfg: &'a NotifyProviderConfig,
		recipient: &'a str,
		content: &'a Value,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(notify_provider::send(cfg, recipient, content))
	}
}
