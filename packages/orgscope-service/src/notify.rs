//! Subscription diff-and-notify cycle.
//!
//! Every watched phrase is re-ranked against the live snapshot and compared with its last committed
//! result. Newly matching members are grouped per subscriber so each subscriber receives at most
//! one message per cycle, however many of their phrases changed.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;

use orgscope_domain::MemberId;

use crate::{OrgService, Result, SearchItem, search};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum NotifyCycle {
	Completed(NotifyReport),
	/// Another cycle was still running, or no snapshot has been published yet.
	Skipped,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
	pub phrases: Vec<PhraseOutcome>,
	pub messages_sent: usize,
	pub messages_failed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhraseOutcome {
	pub phrase: String,
	pub state: PhraseState,
	/// Members matching now that were absent from the last committed result.
	pub delta: Vec<MemberId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhraseState {
	/// Nothing new to announce.
	Idle,
	Committed,
	/// A message carrying this phrase failed; the delta is recomputed next cycle.
	Failed,
}

struct PhraseWork {
	phrase: String,
	current: Vec<String>,
	changed: bool,
	delta: Vec<MemberId>,
	items: Vec<SearchItem>,
	delivered: bool,
}

impl OrgService {
	pub async fn run_notify_cycle(&self) -> Result<NotifyCycle> {
		let Ok(_cycle) = self.notify_guard.try_lock() else {
			tracing::info!("Notify cycle skipped because the previous cycle is still running.");

			return Ok(NotifyCycle::Skipped);
		};

		if !self.is_published() {
			tracing::info!("Notify cycle skipped because no snapshot has been published yet.");

			return Ok(NotifyCycle::Skipped);
		}

		let records = self.store.list_subscriptions().await?;
		let snapshot = self.snapshot();
		let mut work = Vec::with_capacity(records.len());
		let mut inbox: IndexMap<String, Vec<usize>> = IndexMap::new();

		for record in records {
			let ranking = self.rank(&record.keyword);
			let live = search::live_entries(&snapshot, &ranking);
			let known = record.member_ids.iter().map(String::as_str).collect::<HashSet<_>>();
			let fresh = live
				.iter()
				.filter(|entry| !known.contains(entry.id.as_str()))
				.copied()
				.collect::<Vec<_>>();
			let current = live.iter().map(|entry| entry.id.to_string()).collect::<Vec<_>>();
			let shown = fresh.len().min(self.cfg.search.notify_page_size as usize);
			let items = self.render(&snapshot, &fresh[..shown], &record.keyword, false);

			if !fresh.is_empty() {
				for subscriber in &record.subscribers {
					inbox.entry(subscriber.clone()).or_default().push(work.len());
				}
			}

			work.push(PhraseWork {
				changed: current != record.member_ids,
				delta: fresh.iter().map(|entry| entry.id.clone()).collect(),
				phrase: record.keyword,
				current,
				items,
				delivered: true,
			});
		}

		let mut report = NotifyReport::default();

		for (subscriber, sections) in &inbox {
			let content = compose(
				&self.cfg.providers.notify.title,
				&self.cfg.providers.notify.app_url,
				sections.iter().map(|&i| (work[i].phrase.as_str(), work[i].items.as_slice())),
			);

			let sent =
				self.providers.notify.send(&self.cfg.providers.notify, subscriber, &content).await;

			match sent {
				Ok(()) => report.messages_sent += 1,
				Err(err) => {
					tracing::error!(subscriber, error = %err, "Notification delivery failed.");

					report.messages_failed += 1;

					for &i in sections {
						work[i].delivered = false;
					}
				},
			}
		}

		let commits = work
			.iter()
			.filter(|phrase| {
				if phrase.delta.is_empty() { phrase.changed } else { phrase.delivered }
			})
			.map(|phrase| (phrase.phrase.clone(), phrase.current.clone()))
			.collect::<Vec<_>>();

		if !commits.is_empty() {
			self.store.commit_results(&commits, OffsetDateTime::now_utc()).await?;
		}

		report.phrases = work
			.into_iter()
			.map(|phrase| PhraseOutcome {
				state: match (phrase.delta.is_empty(), phrase.delivered) {
					(true, _) => PhraseState::Idle,
					(false, true) => PhraseState::Committed,
					(false, false) => PhraseState::Failed,
				},
				phrase: phrase.phrase,
				delta: phrase.delta,
			})
			.collect();

		tracing::info!(
			phrases = report.phrases.len(),
			messages_sent = report.messages_sent,
			messages_failed = report.messages_failed,
			"Notify cycle finished."
		);

		Ok(NotifyCycle::Completed(report))
	}
}

/// Rich-text message body: a linked heading per phrase followed by one line per member.
pub(crate) fn compose<'a, I>(title: &str, app_url: &str, sections: I) -> Value
where
	I: IntoIterator<Item = (&'a str, &'a [SearchItem])>,
{
	let mut content = Vec::new();

	for (phrase, items) in sections {
		content.push(json!([
			{ "tag": "a", "href": app_url, "text": format!("---Key word: {phrase}---") },
		]));

		for item in items {
			content.push(json!([
				{ "tag": "at", "user_id": item.member_id, "user_name": item.name },
				{ "tag": "a", "href": item.profile_url, "text": "'s OKR" },
				{ "tag": "text", "text": format!("\n{}", item.excerpt) },
			]));
		}
	}

	json!({ "title": title, "content": content })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn compose_renders_one_heading_per_phrase() {
		let item = SearchItem {
			member_id: MemberId::from("ou_2"),
			name: "Bob".to_string(),
			profile_url: "https://okr/bob".to_string(),
			avatar: String::new(),
			excerpt: "O1: Launch".to_string(),
			highly_recommended: false,
		};
		let items = vec![item];
		let content = compose(
			"Alerts",
			"https://app",
			[("launch", items.as_slice()), ("quota", &[][..])],
		);

		assert_eq!(content["title"], "Alerts");
		assert_eq!(content["content"].as_array().map(Vec::len), Some(3));
		assert_eq!(content["content"][0][0]["text"], "---Key word: launch---");
		assert_eq!(content["content"][1][0]["user_id"], "ou_2");
		assert_eq!(content["content"][1][2]["text"], "\nO1: Launch");
		assert_eq!(content["content"][2][0]["href"], "https://app");
	}
}
