//! Catalog data model
//!
//! - `Document` - the stored aggregate (series, chapters, announcements)
//! - `SeriesRecord` / `ChapterRecord` - typed keys, loosely typed metadata
//! - `VersionToken` / `Revision` - revision identity used for CAS

mod document;
mod records;
mod version;

pub use document::{ChapterLayout, ChapterMap, Document};
pub use records::{
    number_from_value, number_value, ChapterRecord, SeriesRecord, DEFAULT_CHAPTER_NUMBER,
};
pub use version::{Revision, VersionToken};
