//! Merge engine
//!
//! Pure document transformation. No I/O happens here.

mod chapter_store;
mod engine;

pub use chapter_store::{chapter_store, ChapterStore, LegacyChapters, NestedChapters, Upserted};
pub use engine::{chapter_number, merge, merge_all, MergeEffect, Merged};
