//! Branch names and commit messages for submissions.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::submission::RecordKind;

/// Prefix of every review branch this service creates
pub const BRANCH_PREFIX: &str = "submit/";

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("ref-safe pattern"));

/// Reduce a slug to characters that are safe in a ref name.
pub fn sanitize_slug(slug: &str) -> String {
    let lowered = slug.trim().to_lowercase();
    let replaced = UNSAFE_RUN.replace_all(&lowered, "-");

    let trimmed = replaced.trim_matches('-');
    if trimmed.is_empty() {
        "entry".to_string()
    } else {
        trimmed.chars().take(60).collect()
    }
}

/// `submit/<type>-<slug>-<yyyymmddHHMMSSmmm>`
pub fn review_branch_name(kind: RecordKind, subject: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}{}-{}-{}",
        BRANCH_PREFIX,
        kind.as_str(),
        sanitize_slug(subject),
        at.format("%Y%m%d%H%M%S%3f")
    )
}

pub fn commit_message(kind: RecordKind, subject: &str) -> String {
    format!("chore(data): update {} {} via submit", kind.as_str(), subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_slug() {
        assert_eq!(sanitize_slug("Solo Leveling!"), "solo-leveling");
        assert_eq!(sanitize_slug("a//b..c"), "a-b-c");
        assert_eq!(sanitize_slug("   "), "entry");
        assert_eq!(sanitize_slug("ch-7"), "ch-7");
    }

    #[test]
    fn test_branch_name_is_deterministic() {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(42);
        let name = review_branch_name(RecordKind::Chapter, "Ch 1", at);
        assert_eq!(name, "submit/chapter-ch-1-20240305140709042");
        assert_eq!(name, review_branch_name(RecordKind::Chapter, "Ch 1", at));
    }

    #[test]
    fn test_commit_message() {
        assert_eq!(
            commit_message(RecordKind::Series, "a"),
            "chore(data): update series a via submit"
        );
    }
}
