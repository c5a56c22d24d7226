//! Series and chapter records.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One series entry of the catalog.
///
/// Only `slug` and the nested `chapters` are typed; display metadata
/// (title, cover, genres, counters, ...) is kept as an ordered map so
/// fields this service does not know about survive a round trip.
///
/// Decoding never fails on shape. A non-string `slug` or a non-array
/// `chapters` stays in `meta`, a draft without a slug gets an empty one,
/// and an entry that is not an object at all is written back verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesRecord {
    pub slug: String,

    pub meta: Map<String, Value>,

    /// Present only in the nested chapter layout
    pub chapters: Option<Vec<ChapterRecord>>,

    opaque: Option<Value>,
}

impl From<Map<String, Value>> for SeriesRecord {
    fn from(fields: Map<String, Value>) -> Self {
        let mut record = Self::default();
        for (key, value) in fields {
            match value {
                Value::String(slug) if key == "slug" => record.slug = slug,
                Value::Array(items) if key == "chapters" => {
                    record.chapters = Some(items.into_iter().map(ChapterRecord::from_value).collect());
                }
                value => {
                    record.meta.insert(key, value);
                }
            }
        }
        record
    }
}

impl<'de> Deserialize<'de> for SeriesRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(fields) => Self::from(fields),
            other => Self {
                opaque: Some(other),
                ..Self::default()
            },
        })
    }
}

impl Serialize for SeriesRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(value) = &self.opaque {
            return value.serialize(serializer);
        }

        let mut map = serializer.serialize_map(None)?;
        if !self.slug.is_empty() {
            map.serialize_entry("slug", &self.slug)?;
        }
        for (key, value) in &self.meta {
            map.serialize_entry(key, value)?;
        }
        if let Some(chapters) = &self.chapters {
            map.serialize_entry("chapters", chapters)?;
        }
        map.end()
    }
}

impl SeriesRecord {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn cover(&self) -> Option<&str> {
        self.text("cover")
    }

    /// Genres rendered as strings; non-string entries are stringified.
    pub fn genres(&self) -> Vec<String> {
        match self.meta.get("genres") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|g| match g {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Numeric counter (rating, views, bookmarks); absent counts as zero.
    pub fn counter(&self, key: &str) -> f64 {
        self.meta.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }
}

/// Keys a stored chapter may carry its identifier under, in order.
const IDENTIFIER_KEYS: [&str; 3] = ["id", "identifier", "slug"];

/// Chapter number used when none is stored.
pub const DEFAULT_CHAPTER_NUMBER: f64 = 1.0;

/// One chapter entry.
///
/// The stored JSON is kept as is and read through accessors, so entries
/// of any shape (page objects, `slug` instead of `id`, bare page lists)
/// decode and are written back unchanged. Entries without a string
/// identifier are carried along but never addressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRecord {
    id: String,
    fields: Value,
}

impl ChapterRecord {
    pub fn from_value(fields: Value) -> Self {
        let id = IDENTIFIER_KEYS
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|id| !id.is_empty())
            .unwrap_or_default()
            .to_string();
        Self { id, fields }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self::from_value(Value::Object(fields))
    }

    /// Identifier; empty for entries that have none.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_addressable(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Ordering hint; absent or unreadable numbers count as 1.
    pub fn number(&self) -> f64 {
        self.get("number")
            .and_then(number_from_value)
            .unwrap_or(DEFAULT_CHAPTER_NUMBER)
    }

    /// Opaque page references, in reading order.
    pub fn pages(&self) -> &[Value] {
        self.get("pages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn published_at(&self) -> Option<&str> {
        self.get("publishedAt").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.fields
    }
}

impl<'de> Deserialize<'de> for ChapterRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl Serialize for ChapterRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}

/// Integral chapter numbers are stored as integers so files keep `7`
/// rather than `7.0`.
pub fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::from(number as i64)
    } else {
        Value::from(number)
    }
}

/// Reads a chapter number out of a JSON value.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Stored documents may carry `null` where a collection is expected.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_series_keeps_unknown_fields() {
        let raw = json!({"slug": "a", "title": "A", "weird": {"x": 1}});
        let record: SeriesRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.title(), Some("A"));
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_chapter_accepts_identifier_alias() {
        let record: ChapterRecord =
            serde_json::from_value(json!({"identifier": "a-001", "pages": ["p1"]})).unwrap();
        assert_eq!(record.id(), "a-001");
        assert_eq!(record.number(), 1.0);
    }

    #[test]
    fn test_chapter_keyed_by_slug() {
        let record: ChapterRecord =
            serde_json::from_value(json!({"slug": "ch-2", "number": "2"})).unwrap();
        assert_eq!(record.id(), "ch-2");
        assert_eq!(record.number(), 2.0);
        assert!(record.pages().is_empty());
    }

    #[test]
    fn test_chapter_written_back_unchanged() {
        let raw = json!({"number": "7", "pages": [{"url": "p1", "w": 800}], "publishedAt": 12});
        let record: ChapterRecord = serde_json::from_value(raw.clone()).unwrap();
        assert!(!record.is_addressable());
        assert_eq!(record.pages().len(), 1);
        assert_eq!(record.published_at(), None);
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_bare_value_kept_as_chapter_entry() {
        let record: ChapterRecord = serde_json::from_value(json!("u1")).unwrap();
        assert_eq!(record.id(), "");
        assert_eq!(serde_json::to_value(&record).unwrap(), json!("u1"));
    }

    #[test]
    fn test_number_value_is_compact() {
        assert_eq!(number_value(7.0), json!(7));
        assert_eq!(number_value(7.5), json!(7.5));
    }

    #[test]
    fn test_series_without_slug_round_trips() {
        let raw = json!({"title": "Draft", "chapters": 3});
        let record: SeriesRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.slug, "");
        assert!(record.chapters.is_none());
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_non_object_series_entry_round_trips() {
        let record: SeriesRecord = serde_json::from_value(json!("todo")).unwrap();
        assert_eq!(record.slug, "");
        assert_eq!(serde_json::to_value(&record).unwrap(), json!("todo"));
    }

    #[test]
    fn test_genres_stringified() {
        let record: SeriesRecord =
            serde_json::from_value(json!({"slug": "a", "genres": ["Action", 3]})).unwrap();
        assert_eq!(record.genres(), vec!["Action".to_string(), "3".to_string()]);
    }
}
