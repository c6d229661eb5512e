use serde::Serialize;
use time::OffsetDateTime;

use orgscope_domain::{MemberId, highlight, phrase};

use crate::{Error, OrgService, OrgSnapshot, Ranking, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchItem {
	pub member_id: MemberId,
	pub name: String,
	pub profile_url: String,
	pub avatar: String,
	pub excerpt: String,
	pub highly_recommended: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub phrase: String,
	pub page: usize,
	/// Live matches across all pages.
	pub total: usize,
	/// Zero-based page numbers available for this phrase.
	pub pages: Vec<usize>,
	pub items: Vec<SearchItem>,
}

/// Canonical cache and subscription key for user input: normalized and case-folded.
pub fn canonical_phrase(raw: &str) -> String {
	phrase::normalize_phrase(raw).to_lowercase()
}

impl OrgService {
	/// One page of ranked, highlighted results. Ids that no longer resolve are dropped before
	/// slicing, so pages are contiguous slices of the live list.
	pub async fn search(&self, query: &str, page: usize) -> Result<SearchResponse> {
		let phrase = canonical_phrase(query);

		if phrase.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Search phrase must be non-empty.".to_string(),
			});
		}

		self.record_search_terms(&phrase).await;

		let snapshot = self.snapshot();
		let ranking = self.rank(&phrase);
		let live = live_entries(&snapshot, &ranking);
		let size = self.cfg.search.page_size as usize;
		let start = page.saturating_mul(size).min(live.len());
		let end = start.saturating_add(size).min(live.len());
		let items = self.render(&snapshot, &live[start..end], &phrase, true);

		Ok(SearchResponse {
			total: live.len(),
			pages: (0..live.len().div_ceil(size)).collect(),
			page,
			phrase,
			items,
		})
	}

	pub(crate) fn render(
		&self,
		snapshot: &OrgSnapshot,
		entries: &[LiveEntry<'_>],
		phrase: &str,
		emphasize: bool,
	) -> Vec<SearchItem> {
		let terms = phrase::terms(phrase);
		let open = self.cfg.search.highlight.open_tag.as_str();
		let close = self.cfg.search.highlight.close_tag.as_str();

		entries
			.iter()
			.filter_map(|entry| {
				let member = snapshot.member(entry.id.as_str())?;
				let excerpt = member.okr.excerpt(&terms);
				let excerpt = if emphasize {
					highlight::emphasize(&excerpt, &terms, open, close)
				} else {
					excerpt
				};

				Some(SearchItem {
					member_id: entry.id.clone(),
					name: member.profile.name.clone(),
					profile_url: format!(
						"{}{}",
						self.cfg.service.profile_url_base, member.profile.profile_path
					),
					avatar: member.profile.avatar.clone(),
					excerpt,
					highly_recommended: entry.top,
				})
			})
			.collect()
	}

	async fn record_search_terms(&self, phrase: &str) {
		let now = OffsetDateTime::now_utc();
		let max_chars = self.cfg.search.max_fragment_chars as usize;

		for term in phrase::terms(phrase) {
			let fragment = phrase::fragment(&term, max_chars);

			if let Err(err) = self.store.record_search(fragment, now).await {
				tracing::warn!(fragment, error = %err, "Search frequency update failed.");
			}
		}
	}
}

/// A ranked id that still resolves, with whether its original rank made it a top match.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LiveEntry<'a> {
	pub(crate) id: &'a MemberId,
	pub(crate) top: bool,
}

pub(crate) fn live_entries<'a>(snapshot: &OrgSnapshot, ranking: &'a Ranking) -> Vec<LiveEntry<'a>> {
	ranking
		.ids
		.iter()
		.enumerate()
		.filter(|(_, id)| snapshot.member(id.as_str()).is_some())
		.map(|(rank, id)| LiveEntry { id, top: rank < ranking.high_recommend })
		.collect()
}
