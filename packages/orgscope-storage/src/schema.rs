pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		match line.trim().strip_prefix("\\ir ").map(str::trim) {
			Some("tables/001_subscriptions.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_subscriptions.sql")),
			Some("tables/002_search_stats.sql") =>
				out.push_str(include_str!("../../../sql/tables/002_search_stats.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS subscriptions"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS search_stats"));
	}
}
