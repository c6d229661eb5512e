use std::collections::{BTreeSet, HashSet};

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Character reserved for joining id lists in external stores; tokens may never contain it.
pub const LIST_DELIMITER: char = ';';

/// Splits `text` into its set of normalized tokens.
///
/// Tokens are NFKC-normalized, trimmed and lowercased. Stop words, empty tokens, single
/// ASCII characters and tokens containing [`LIST_DELIMITER`] are dropped.
pub fn segment(text: &str, stop_words: &HashSet<String>) -> BTreeSet<String> {
	let normalized = text.nfkc().collect::<String>();

	normalized
		.unicode_words()
		.map(|word| word.trim().to_lowercase())
		.filter(|token| keep_token(token, stop_words))
		.collect()
}

fn keep_token(token: &str, stop_words: &HashSet<String>) -> bool {
	!token.is_empty()
		&& !is_single_ascii(token)
		&& !token.contains(LIST_DELIMITER)
		&& !stop_words.contains(token)
}

fn is_single_ascii(token: &str) -> bool {
	let mut chars = token.chars();

	matches!((chars.next(), chars.next()), (Some(ch), None) if ch.is_ascii())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stop_words() -> HashSet<String> {
		["the", "of"].into_iter().map(str::to_string).collect()
	}

	#[test]
	fn lowercases_and_drops_noise() {
		let tokens = segment("The Quota plan of Q3 a growth x", &stop_words());

		assert_eq!(
			tokens.into_iter().collect::<Vec<_>>(),
			vec!["growth".to_string(), "plan".into(), "q3".into(), "quota".into()]
		);
	}

	#[test]
	fn keeps_single_non_ascii_characters() {
		let tokens = segment("增长 é", &HashSet::new());

		assert!(tokens.contains("增"));
		assert!(tokens.contains("é"));
	}

	#[test]
	fn folds_compatibility_forms() {
		let tokens = segment("ＱＵＯＴＡ", &HashSet::new());

		assert!(tokens.contains("quota"));
	}

	#[test]
	fn single_ascii_check_only_matches_one_char() {
		assert!(is_single_ascii("x"));
		assert!(!is_single_ascii("xy"));
		assert!(!is_single_ascii("é"));
	}
}
