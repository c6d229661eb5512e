use serde::Serialize;

use crate::{OrgService, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeywordStat {
	pub keyword: String,
	pub freq: i64,
	/// Frequency relative to the most searched fragment.
	pub percent: f64,
}

impl OrgService {
	/// The `n` most searched fragments, most frequent first.
	pub async fn top_search_keywords(&self, n: u32) -> Result<Vec<KeywordStat>> {
		let stats = self.store.top_searches(n).await?;
		let max = stats.first().map(|stat| stat.freq).unwrap_or_default();

		Ok(stats
			.into_iter()
			.map(|stat| KeywordStat {
				percent: if max > 0 { stat.freq as f64 * 100.0 / max as f64 } else { 0.0 },
				keyword: stat.fragment,
				freq: stat.freq,
			})
			.collect())
	}
}
