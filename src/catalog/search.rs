//! Keyword search over series titles, slugs and genres.

use std::sync::LazyLock;

use regex::Regex;

use super::views::{card, SeriesCard};
use crate::model::{Document, SeriesRecord};

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("punctuation pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let spaced = PUNCTUATION.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

fn haystack(series: &SeriesRecord) -> String {
    [
        normalize(series.title().unwrap_or_default()),
        normalize(&series.slug),
        normalize(&series.genres().join(" ")),
    ]
    .join(" ")
}

/// Series where every query term occurs. An empty query matches nothing.
pub fn search(document: &Document, query: &str) -> Vec<SeriesCard> {
    let normalized = normalize(query);
    let terms: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return Vec::new();
    }

    document
        .series
        .iter()
        .filter(|s| {
            let hay = haystack(s);
            terms.iter().all(|t| hay.contains(t))
        })
        .map(|s| card(document, s))
        .collect()
}
