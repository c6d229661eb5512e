use regex::{Captures, RegexBuilder};

/// Wraps every case-insensitive occurrence of any term in `open`/`close`, keeping the matched
/// text's original casing. Longer terms win where terms overlap.
pub fn emphasize<S>(text: &str, terms: &[S], open: &str, close: &str) -> String
where
	S: AsRef<str>,
{
	let mut alternatives = terms
		.iter()
		.map(AsRef::as_ref)
		.filter(|term| !term.is_empty())
		.collect::<Vec<_>>();

	if alternatives.is_empty() {
		return text.to_string();
	}

	alternatives.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

	let pattern = alternatives.iter().map(|term| regex::escape(term)).collect::<Vec<_>>().join("|");
	let Ok(matcher) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
		return text.to_string();
	};

	matcher.replace_all(text, |caps: &Captures| format!("{open}{}{close}", &caps[0])).into_owned()
}

pub fn contains_any_term<S>(text: &str, terms: &[S]) -> bool
where
	S: AsRef<str>,
{
	let text = text.to_lowercase();

	terms.iter().any(|term| {
		let term = term.as_ref();

		!term.is_empty() && text.contains(&term.to_lowercase())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wraps_each_occurrence_preserving_case() {
		let out = emphasize("Quota plan: QUOTA first", &["quota"], "<em>", "</em>");

		assert_eq!(out, "<em>Quota</em> plan: <em>QUOTA</em> first");
	}

	#[test]
	fn longer_terms_take_precedence() {
		let out = emphasize("the planner plans", &["plan", "planner"], "[", "]");

		assert_eq!(out, "the [planner] [plan]s");
	}

	#[test]
	fn markers_are_never_rematched() {
		let out = emphasize("em and m", &["em", "m"], "<em>", "</em>");

		assert_eq!(out, "<em>em</em> and <em>m</em>");
	}

	#[test]
	fn no_terms_leaves_text_untouched() {
		let empty: [&str; 0] = [];

		assert_eq!(emphasize("plain", &empty, "<em>", "</em>"), "plain");
		assert!(!contains_any_term("plain", &[""]));
		assert!(contains_any_term("Plain", &["AIN"]));
	}
}
