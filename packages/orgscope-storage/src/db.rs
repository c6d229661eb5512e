use sqlx::{PgPool, postgres::PgPoolOptions};
use time::OffsetDateTime;

use crate::{
	Result,
	models::{SearchStat, SubscriptionRecord},
	records::{self, BoxFuture, RecordStore, Removal},
	schema,
};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &orgscope_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 7_120_209;
		// Advisory locks are held per connection; the transaction pins the lock to one connection
		// and releases it on commit.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	async fn remove_subscriber_tx(&self, keyword: &str, subscriber: &str) -> Result<Removal> {
		let mut tx = self.pool.begin().await?;
		let subscribers: Option<Vec<String>> = sqlx::query_scalar(
			"SELECT subscribers FROM subscriptions WHERE keyword = $1 FOR UPDATE",
		)
		.bind(keyword)
		.fetch_optional(&mut *tx)
		.await?;
		let Some(subscribers) = subscribers else {
			return Ok(Removal::UnknownKeyword);
		};

		if !subscribers.iter().any(|existing| existing == subscriber) {
			return Ok(Removal::NotSubscribed);
		}

		let removal = if subscribers.len() == 1 {
			sqlx::query("DELETE FROM subscriptions WHERE keyword = $1")
				.bind(keyword)
				.execute(&mut *tx)
				.await?;

			Removal::RemovedLast
		} else {
			sqlx::query(
				"\
UPDATE subscriptions
SET subscribers = array_remove(subscribers, $2)
WHERE keyword = $1",
			)
			.bind(keyword)
			.bind(subscriber)
			.execute(&mut *tx)
			.await?;

			Removal::Removed
		};

		tx.commit().await?;

		Ok(removal)
	}

	async fn commit_results_tx(
		&self,
		results: &[(String, Vec<String>)],
		now: OffsetDateTime,
	) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		for (keyword, member_ids) in results {
			sqlx::query(
				"\
UPDATE subscriptions
SET member_ids = $2, updated_at = $3
WHERE keyword = $1",
			)
			.bind(keyword.as_str())
			.bind(member_ids)
			.bind(now)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
impl RecordStore for Db {
	fn get_subscription<'a>(
		&'a self,
		keyword: &'a str,
	) -> BoxFuture<'a, Result<Option<SubscriptionRecord>>> {
		Box::pin(async move {
			let record = sqlx::query_as::<_, SubscriptionRecord>(
				"\
SELECT keyword, subscribers, member_ids, updated_at
FROM subscriptions
WHERE keyword = $1",
			)
			.bind(keyword)
			.fetch_optional(&self.pool)
			.await?;

			Ok(record)
		})
	}

	fn add_subscriber<'a>(
		&'a self,
		keyword: &'a str,
		subscriber: &'a str,
		member_ids: &'a [String],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			records::require_non_empty("keyword", keyword)?;
			records::require_non_empty("subscriber", subscriber)?;

			// The conflict arm only fires for new subscribers, so zero affected rows means the
			// subscriber was already present.
			let result = sqlx::query(
				"\
INSERT INTO subscriptions (keyword, subscribers, member_ids, updated_at)
VALUES ($1, ARRAY[$2], $3, $4)
ON CONFLICT (keyword) DO UPDATE
SET subscribers = array_append(subscriptions.subscribers, $2),
	updated_at = $4
WHERE NOT ($2 = ANY(subscriptions.subscribers))",
			)
			.bind(keyword)
			.bind(subscriber)
			.bind(member_ids)
			.bind(now)
			.execute(&self.pool)
			.await?;

			Ok(result.rows_affected() > 0)
		})
	}

	fn remove_subscriber<'a>(
		&'a self,
		keyword: &'a str,
		subscriber: &'a str,
	) -> BoxFuture<'a, Result<Removal>> {
		Box::pin(self.remove_subscriber_tx(keyword, subscriber))
	}

	fn list_subscriptions(&self) -> BoxFuture<'_, Result<Vec<SubscriptionRecord>>> {
		Box::pin(async move {
			let records = sqlx::query_as::<_, SubscriptionRecord>(
				"\
SELECT keyword, subscribers, member_ids, updated_at
FROM subscriptions
ORDER BY keyword",
			)
			.fetch_all(&self.pool)
			.await?;

			Ok(records)
		})
	}

	fn subscriptions_for<'a>(
		&'a self,
		subscriber: &'a str,
	) -> BoxFuture<'a, Result<Vec<SubscriptionRecord>>> {
		Box::pin(async move {
			let records = sqlx::query_as::<_, SubscriptionRecord>(
				"\
SELECT keyword, subscribers, member_ids, updated_at
FROM subscriptions
WHERE $1 = ANY(subscribers)
ORDER BY keyword",
			)
			.bind(subscriber)
			.fetch_all(&self.pool)
			.await?;

			Ok(records)
		})
	}

	fn commit_results<'a>(
		&'a self,
		results: &'a [(String, Vec<String>)],
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.commit_results_tx(results, now))
	}

	fn record_search<'a>(
		&'a self,
		fragment: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			records::require_non_empty("fragment", fragment)?;

			sqlx::query(
				"\
INSERT INTO search_stats (fragment, freq, last_searched_at)
VALUES ($1, 1, $2)
ON CONFLICT (fragment) DO UPDATE
SET freq = search_stats.freq + 1,
	last_searched_at = EXCLUDED.last_searched_at",
			)
			.bind(fragment)
			.bind(now)
			.execute(&self.pool)
			.await?;

			Ok(())
		})
	}

	fn top_searches(&self, limit: u32) -> BoxFuture<'_, Result<Vec<SearchStat>>> {
		Box::pin(async move {
			let stats = sqlx::query_as::<_, SearchStat>(
				"\
SELECT fragment, freq, last_searched_at
FROM search_stats
ORDER BY freq DESC, fragment
LIMIT $1",
			)
			.bind(i64::from(limit))
			.fetch_all(&self.pool)
			.await?;

			Ok(stats)
		})
	}
}
