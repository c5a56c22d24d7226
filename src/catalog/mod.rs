//! Catalog read views
//!
//! Projections of a document snapshot served by the read endpoints:
//! - listings: latest, popular, recommendations, announcements
//! - lookups: series detail, chapter by id
//! - discovery: keyword search, genre index, genre listing

mod search;
mod views;

pub use search::{normalize as normalize_query, search};
pub use views::{
    announcements, by_genre, card, chapter, genres, latest, popular, recommendations,
    series_detail, GenrePage, PageQuery, PopularRange, SeriesCard, SeriesDetail,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
