//! Search phrase handling shared by ranking, subscriptions and analytics.

use std::collections::HashSet;

use crate::tokenize::LIST_DELIMITER;

/// Canonical form of a user-supplied phrase: delimiter characters removed and whitespace runs
/// collapsed to a single space.
pub fn normalize_phrase(raw: &str) -> String {
	raw.replace(LIST_DELIMITER, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Distinct whitespace-separated terms, in first-occurrence order. Case is preserved; callers fold
/// it where matching requires.
pub fn terms(phrase: &str) -> Vec<String> {
	let mut seen = HashSet::new();

	phrase
		.split_whitespace()
		.filter(|term| seen.insert(term.to_lowercase()))
		.map(str::to_string)
		.collect()
}

/// Truncates `term` to at most `max_chars` characters.
pub fn fragment(term: &str, max_chars: usize) -> &str {
	match term.char_indices().nth(max_chars) {
		Some((end, _)) => &term[..end],
		None => term,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalization_strips_delimiters_and_spaces() {
		assert_eq!(normalize_phrase("  quota;plan \t growth  "), "quota plan growth");
		assert_eq!(normalize_phrase(" ; "), "");
	}

	#[test]
	fn terms_are_distinct_ignoring_case() {
		assert_eq!(terms("Quota plan quota"), vec!["Quota".to_string(), "plan".into()]);
	}

	#[test]
	fn fragments_respect_char_boundaries() {
		assert_eq!(fragment("增长计划", 2), "增长");
		assert_eq!(fragment("plan", 31), "plan");
	}
}
