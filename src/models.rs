use jiff::{Zoned, civil};
use serde::{Deserialize, Serialize};

pub const KINO_BABYLON: &str = "Kino Babylon";

/// Canonical screening record, one per (film, showtime) across all sources.
/// Immutable once stored; `id` is the storage row id and doubles as
/// insertion order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Screening {
    pub id: i64,
    pub scrape_id: i64,
    pub title: String,
    pub date: Zoned,
    pub duration: i32,
    pub cinema: String,
    pub thumbnail_url: String,
    pub description: String,
    pub link: String,
}

/// A screening as produced by a source adapter, before the store has
/// assigned a row id.
#[derive(Clone, Debug)]
pub struct NewScreening {
    pub scrape_id: i64,
    pub title: String,
    pub date: Zoned,
    pub duration: i32,
    pub cinema: String,
    pub thumbnail_url: String,
    pub description: String,
    pub link: String,
}

/// Query request as it arrives from the filter form. Empty fields are
/// unconstrained.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Filter {
    #[serde(default, rename = "scrape-ids")]
    pub scrape_id: String,
    #[serde(default, rename = "dates")]
    pub date: String,
    #[serde(default, rename = "cinemas")]
    pub cinema: String,
}

/// Distinct values offered for filtering, restricted to today-or-later.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub scrape_ids: Vec<i64>,
    pub dates: Vec<civil::Date>,
    pub cinemas: Vec<String>,
}
