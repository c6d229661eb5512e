use std::collections::{BTreeSet, HashMap, HashSet};

use orgscope_domain::{MemberId, phrase};

use crate::{OrgService, OrgSnapshot, Tokenizer};

pub(crate) const RESULT_PREFIX: &str = "search:";
pub(crate) const HIGH_RECOMMEND_PREFIX: &str = "high_recommend:";

const HIGH_RECOMMEND_FIELD: &str = "count";

/// Ordered result for one phrase. The first `high_recommend` entries are top matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ranking {
	pub ids: Vec<MemberId>,
	pub high_recommend: usize,
}

impl OrgService {
	/// Ranked ids for a canonical phrase, served from the cache when present.
	pub fn rank(&self, phrase: &str) -> Ranking {
		let _gate = self.cache_gate.read().unwrap_or_else(|err| err.into_inner());

		if let Some(cached) = self.cached_ranking(phrase) {
			return cached;
		}

		let ranking = compute(&self.live.load(), self.providers.tokenizer.as_ref(), phrase);

		// The count marks the entry complete, so it lands after the list.
		self.cache.replace_list(
			&format!("{RESULT_PREFIX}{phrase}"),
			ranking.ids.iter().map(|id| id.to_string()).collect(),
		);
		self.cache.hset(
			&format!("{HIGH_RECOMMEND_PREFIX}{phrase}"),
			HIGH_RECOMMEND_FIELD,
			ranking.high_recommend.to_string(),
		);

		ranking
	}

	fn cached_ranking(&self, phrase: &str) -> Option<Ranking> {
		let high_recommend = self
			.cache
			.hget(&format!("{HIGH_RECOMMEND_PREFIX}{phrase}"), HIGH_RECOMMEND_FIELD)?
			.parse()
			.ok()?;
		let key = format!("{RESULT_PREFIX}{phrase}");

		if !self.cache.exists(&key) {
			return None;
		}

		let ids = self.cache.lrange(&key, 0, None).into_iter().map(MemberId::from).collect();

		Some(Ranking { ids, high_recommend })
	}
}

/// Exact-phrase postings first, then display-name hits, then content hits ordered by how many
/// distinct terms matched. Ties keep first-seen order; every id keeps its earliest position.
///
/// A term hits a member's content when the member carries every token the term segments into.
pub(crate) fn compute(
	snapshot: &OrgSnapshot,
	tokenizer: &dyn Tokenizer,
	phrase: &str,
) -> Ranking {
	let terms =
		phrase::terms(phrase).into_iter().map(|term| term.to_lowercase()).collect::<Vec<_>>();
	let mut out = Collector::default();

	for id in snapshot.postings(&phrase.to_lowercase()) {
		out.take(id, terms.len() > 1);
	}

	for term in &terms {
		for id in snapshot.members_named_like(term) {
			out.take(id, true);
		}
	}

	let mut first_seen: Vec<&MemberId> = Vec::new();
	let mut overlap: HashMap<&MemberId, usize> = HashMap::new();

	for term in &terms {
		for id in snapshot.postings_all(&term_tokens(tokenizer, term)) {
			*overlap.entry(id).or_insert_with(|| {
				first_seen.push(id);

				0
			}) += 1;
		}
	}

	// Stable, so equal overlap keeps accumulation order.
	first_seen.sort_by(|a, b| overlap[b].cmp(&overlap[a]));

	for id in first_seen {
		out.take(id, overlap[id] > 1);
	}

	out.ranking
}

/// Tokens a single query term must match. Terms the tokenizer drops entirely are looked up as
/// typed.
pub(crate) fn term_tokens(tokenizer: &dyn Tokenizer, term: &str) -> BTreeSet<String> {
	match tokenizer.tokenize(term) {
		Ok(tokens) if !tokens.is_empty() => tokens,
		_ => BTreeSet::from([term.to_lowercase()]),
	}
}

#[derive(Default)]
struct Collector<'a> {
	ranking: Ranking,
	seen: HashSet<&'a MemberId>,
}
impl<'a> Collector<'a> {
	fn take(&mut self, id: &'a MemberId, top: bool) {
		if !self.seen.insert(id) {
			return;
		}

		self.ranking.ids.push(id.clone());

		if top {
			self.ranking.high_recommend += 1;
		}
	}
}
