//! Read projections over a document snapshot.
//!
//! Pure functions; none of them touch the store or the cache.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::model::{ChapterRecord, Document, SeriesRecord};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;
pub const POPULAR_LIMIT: usize = 10;
pub const RECOMMENDATION_LIMIT: usize = 15;

/// Compact series representation used by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesCard {
    pub id: String,
    pub slug: String,
    pub title: Value,
    pub cover: Value,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// `?page&pageSize`, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageQuery {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Page clamped to >= 1, size clamped to 1..=MAX_PAGE_SIZE.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

/// Paged genre listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenrePage {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<SeriesCard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopularRange {
    /// By bookmarks
    #[default]
    Daily,
    /// By views
    Weekly,
    /// By rating, then views, then bookmarks
    All,
}

impl PopularRange {
    /// Unknown values fall back to `All`, as any non daily/weekly range did.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("daily") => Self::Daily,
            Some("weekly") => Self::Weekly,
            Some(_) => Self::All,
        }
    }
}

/// Detail view of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDetail {
    pub info: Value,
    pub chapters: Vec<ChapterRecord>,
}

// ==================
// Cards
// ==================

fn chapter_timestamp(chapter: &ChapterRecord) -> Option<String> {
    chapter
        .get("createdAt")
        .and_then(Value::as_str)
        .or_else(|| chapter.published_at())
        .map(str::to_string)
}

fn field(series: &SeriesRecord, key: &str) -> Value {
    series.meta.get(key).cloned().unwrap_or(Value::Null)
}

pub fn card(document: &Document, series: &SeriesRecord) -> SeriesCard {
    SeriesCard {
        id: series.slug.clone(),
        slug: series.slug.clone(),
        title: field(series, "title"),
        cover: field(series, "cover"),
        updated_at: document
            .chapters_of(&series.slug)
            .first()
            .and_then(chapter_timestamp),
        badge: Some(series.text("type").unwrap_or("UP").to_string()),
    }
}

fn cards<'a>(document: &Document, series: impl IntoIterator<Item = &'a SeriesRecord>) -> Vec<SeriesCard> {
    series.into_iter().map(|s| card(document, s)).collect()
}

// ==================
// Listings
// ==================

/// Series in document order (most recent first).
pub fn latest(document: &Document, page: PageQuery) -> Vec<SeriesCard> {
    cards(document, page.clamped().slice(&document.series))
}

pub fn popular(document: &Document, range: PopularRange) -> Vec<SeriesCard> {
    let desc = |a: f64, b: f64| b.partial_cmp(&a).unwrap_or(Ordering::Equal);

    let mut sorted: Vec<&SeriesRecord> = document.series.iter().collect();
    match range {
        PopularRange::Daily => {
            sorted.sort_by(|a, b| desc(a.counter("bookmarks"), b.counter("bookmarks")))
        }
        PopularRange::Weekly => sorted.sort_by(|a, b| desc(a.counter("views"), b.counter("views"))),
        PopularRange::All => sorted.sort_by(|a, b| {
            desc(a.counter("rating"), b.counter("rating"))
                .then_with(|| desc(a.counter("views"), b.counter("views")))
                .then_with(|| desc(a.counter("bookmarks"), b.counter("bookmarks")))
        }),
    }

    cards(document, sorted.into_iter().take(POPULAR_LIMIT))
}

pub fn recommendations(document: &Document) -> Vec<SeriesCard> {
    document
        .series
        .iter()
        .take(RECOMMENDATION_LIMIT)
        .map(|s| SeriesCard {
            updated_at: None,
            badge: None,
            ..card(document, s)
        })
        .collect()
}

pub fn announcements(document: &Document) -> &[Value] {
    &document.announcements
}

// ==================
// Lookups
// ==================

pub fn series_detail(document: &Document, slug: &str) -> Option<SeriesDetail> {
    let found = document.find_series(slug)?;
    let text_or = |key: &str, default: &str| {
        found
            .meta
            .get(key)
            .filter(|v| !is_falsy(v))
            .cloned()
            .unwrap_or_else(|| json!(default))
    };
    let number_or_zero = |key: &str| {
        found
            .meta
            .get(key)
            .filter(|v| !is_falsy(v))
            .cloned()
            .unwrap_or_else(|| json!(0))
    };
    let cover = field(found, "cover");
    let banner = found
        .meta
        .get("banner")
        .filter(|v| !is_falsy(v))
        .cloned()
        .unwrap_or_else(|| cover.clone());

    let info = json!({
        "slug": found.slug,
        "title": field(found, "title"),
        "description": text_or("description", ""),
        "type": text_or("type", "Manhwa"),
        "genres": found.meta.get("genres").filter(|v| v.is_array()).cloned().unwrap_or_else(|| json!([])),
        "author": text_or("author", "-"),
        "artist": text_or("artist", "-"),
        "status": text_or("status", "Ongoing"),
        "cover": cover,
        "banner": banner,
        "rating": number_or_zero("rating"),
        "views": number_or_zero("views"),
        "bookmarks": number_or_zero("bookmarks"),
    });

    Some(SeriesDetail {
        info,
        chapters: document.chapters_of(slug).to_vec(),
    })
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

pub fn chapter<'a>(document: &'a Document, id: &str) -> Option<&'a ChapterRecord> {
    document.find_chapter(id)
}

// ==================
// Genres
// ==================

/// Distinct genres, case-insensitively sorted.
pub fn genres(document: &Document) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut all: Vec<String> = document
        .series
        .iter()
        .flat_map(SeriesRecord::genres)
        .filter(|g| seen.insert(g.clone()))
        .collect();
    all.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    all
}

pub fn by_genre(document: &Document, name: &str, page: PageQuery) -> GenrePage {
    let wanted = name.trim().to_lowercase();
    let matching: Vec<&SeriesRecord> = document
        .series
        .iter()
        .filter(|s| s.genres().iter().any(|g| g.to_lowercase() == wanted))
        .collect();

    let page = page.clamped();
    GenrePage {
        total: matching.len(),
        page: page.page,
        page_size: page.page_size,
        items: cards(document, page.slice(&matching).iter().copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_card_shape() {
        let d = doc(json!({
            "series": [{"slug": "a", "title": "A", "cover": "c.jpg", "type": "Manga",
                        "chapters": [{"id": "a-002", "createdAt": "2024-05-01"}, {"id": "a-001"}]}]
        }));
        let c = card(&d, &d.series[0]);
        assert_eq!(c.id, "a");
        assert_eq!(c.badge.as_deref(), Some("Manga"));
        assert_eq!(c.updated_at.as_deref(), Some("2024-05-01"));

        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["updatedAt"], json!("2024-05-01"));
    }

    #[test]
    fn test_card_defaults() {
        let d = doc(json!({"series": [{"slug": "a"}]}));
        let c = card(&d, &d.series[0]);
        assert_eq!(c.badge.as_deref(), Some("UP"));
        assert_eq!(c.updated_at, None);
        assert_eq!(c.title, Value::Null);
    }

    #[test]
    fn test_latest_pages_in_document_order() {
        let series: Vec<Value> = (0..5).map(|i| json!({"slug": format!("s{}", i)})).collect();
        let d = doc(json!({ "series": series }));
        let page = latest(&d, PageQuery::new(2, 2));
        let slugs: Vec<_> = page.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["s2", "s3"]);

        assert!(latest(&d, PageQuery::new(9, 2)).is_empty());
        assert_eq!(latest(&d, PageQuery::new(0, 0)).len(), 1);
    }

    #[test]
    fn test_popular_ranges() {
        let d = doc(json!({"series": [
            {"slug": "a", "bookmarks": 1, "views": 30, "rating": 4.5},
            {"slug": "b", "bookmarks": 9, "views": 10, "rating": 4.5},
            {"slug": "c", "bookmarks": 5, "views": 20, "rating": 3.0},
        ]}));
        let order = |range| -> Vec<String> {
            popular(&d, range).into_iter().map(|c| c.slug).collect()
        };
        assert_eq!(order(PopularRange::Daily), vec!["b", "c", "a"]);
        assert_eq!(order(PopularRange::Weekly), vec!["a", "c", "b"]);
        assert_eq!(order(PopularRange::All), vec!["a", "b", "c"]);
        assert_eq!(PopularRange::parse(Some("Weekly")), PopularRange::Weekly);
        assert_eq!(PopularRange::parse(Some("monthly")), PopularRange::All);
        assert_eq!(PopularRange::parse(None), PopularRange::Daily);
    }

    #[test]
    fn test_recommendations_capped() {
        let series: Vec<Value> = (0..20).map(|i| json!({"slug": format!("s{}", i)})).collect();
        let d = doc(json!({ "series": series }));
        let recs = recommendations(&d);
        assert_eq!(recs.len(), RECOMMENDATION_LIMIT);
        let value = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(value["updatedAt"], Value::Null);
        assert!(value.get("badge").is_none());
    }

    #[test]
    fn test_series_detail_defaults() {
        let d = doc(json!({"series": [{"slug": "a", "title": "A", "cover": "c.jpg"}]}));
        let detail = series_detail(&d, "a").unwrap();
        assert_eq!(detail.info["type"], json!("Manhwa"));
        assert_eq!(detail.info["author"], json!("-"));
        assert_eq!(detail.info["status"], json!("Ongoing"));
        assert_eq!(detail.info["banner"], json!("c.jpg"));
        assert_eq!(detail.info["rating"], json!(0));
        assert_eq!(detail.info["genres"], json!([]));
        assert!(detail.chapters.is_empty());
        assert!(series_detail(&d, "missing").is_none());
    }

    #[test]
    fn test_genres_distinct_and_sorted() {
        let d = doc(json!({"series": [
            {"slug": "a", "genres": ["romance", "Action"]},
            {"slug": "b", "genres": ["Action", "comedy"]},
        ]}));
        assert_eq!(genres(&d), vec!["Action", "comedy", "romance"]);
    }

    #[test]
    fn test_by_genre_second_page() {
        let mut series: Vec<Value> = (0..12)
            .map(|i| json!({"slug": format!("hit{}", i), "genres": ["Action"]}))
            .collect();
        series.insert(3, json!({"slug": "miss", "genres": ["Drama"]}));
        let d = doc(json!({ "series": series }));

        let page = by_genre(&d, "action", PageQuery::new(2, 5));
        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 5);
        let slugs: Vec<_> = page.items.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["hit5", "hit6", "hit7", "hit8", "hit9"]);
    }
}
