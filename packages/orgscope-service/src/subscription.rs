use serde::Serialize;
use time::OffsetDateTime;

use orgscope_storage::Removal;

use crate::{
	Error, OrgService, Result, notify,
	search::{self, canonical_phrase},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SubscribeOutcome {
	Added,
	AlreadySubscribed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnsubscribeOutcome {
	Removed,
	NotSubscribed,
	UnknownPhrase,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubscriptionSummary {
	pub phrase: String,
	/// Size of the last committed result.
	pub match_count: usize,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

impl OrgService {
	/// Watches `phrase` for `subscriber`. A new record starts from the current ranked set, so only
	/// members matching after this point are ever notified.
	pub async fn subscribe(&self, subscriber: &str, phrase: &str) -> Result<SubscribeOutcome> {
		let subscriber = subscriber.trim();
		let phrase = canonical_phrase(phrase);

		if subscriber.is_empty() || phrase.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Subscriber and phrase must be non-empty.".to_string(),
			});
		}

		let snapshot = self.snapshot();
		let ranking = self.rank(&phrase);
		let live = search::live_entries(&snapshot, &ranking);
		let current = live.iter().map(|entry| entry.id.to_string()).collect::<Vec<_>>();
		let shown = live.len().min(self.cfg.search.notify_page_size as usize);
		let items = self.render(&snapshot, &live[..shown], &phrase, false);

		let added = self
			.store
			.add_subscriber(&phrase, subscriber, &current, OffsetDateTime::now_utc())
			.await?;

		if !added {
			return Ok(SubscribeOutcome::AlreadySubscribed);
		}

		tracing::info!(subscriber, phrase = %phrase, "Subscription added.");

		let content = notify::compose(
			&format!("You subscribed the key word {phrase}"),
			&self.cfg.providers.notify.app_url,
			[(phrase.as_str(), items.as_slice())],
		);

		if let Err(err) =
			self.providers.notify.send(&self.cfg.providers.notify, subscriber, &content).await
		{
			tracing::warn!(
				subscriber,
				error = %err,
				"Subscription confirmation was not delivered."
			);
		}

		Ok(SubscribeOutcome::Added)
	}

	pub async fn unsubscribe(&self, subscriber: &str, phrase: &str) -> Result<UnsubscribeOutcome> {
		let subscriber = subscriber.trim();
		let phrase = canonical_phrase(phrase);

		if subscriber.is_empty() || phrase.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Subscriber and phrase must be non-empty.".to_string(),
			});
		}

		let outcome = match self.store.remove_subscriber(&phrase, subscriber).await? {
			Removal::Removed | Removal::RemovedLast => UnsubscribeOutcome::Removed,
			Removal::NotSubscribed => UnsubscribeOutcome::NotSubscribed,
			Removal::UnknownKeyword => UnsubscribeOutcome::UnknownPhrase,
		};

		tracing::info!(subscriber, phrase = %phrase, outcome = ?outcome, "Unsubscribe processed.");

		Ok(outcome)
	}

	pub async fn subscriptions_of(&self, subscriber: &str) -> Result<Vec<SubscriptionSummary>> {
		let records = self.store.subscriptions_for(subscriber.trim()).await?;

		Ok(records
			.into_iter()
			.map(|record| SubscriptionSummary {
				match_count: record.member_ids.len(),
				phrase: record.keyword,
				updated_at: record.updated_at,
			})
			.collect())
	}
}
