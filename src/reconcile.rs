//! Query side of the store: raw filter parsing, the today-or-later date
//! floor, latest-batch-per-cinema reconciliation and facet derivation.
//!
//! Everything here is pure over in-memory rows. `today` is always a
//! parameter, so behavior does not depend on the wall clock.

use jiff::civil;

use crate::models::{Filter, FilterOptions, Screening};

/// Parsed form of the raw filter strings.
#[derive(Clone, Debug, Default)]
pub struct ParsedFilter {
    pub scrape_id: Option<i64>,
    pub day: Option<civil::Date>,
    pub cinema: Option<String>,
}

impl ParsedFilter {
    /// Empty fields are unconstrained. A non-empty field that does not parse
    /// can never match a stored row, so the whole query short-circuits to an
    /// empty result; that case is `None`.
    pub fn parse(raw: &Filter) -> Option<Self> {
        let scrape_id = match raw.scrape_id.trim() {
            "" => None,
            s => Some(s.parse::<i64>().ok()?),
        };
        let day = match raw.date.trim() {
            "" => None,
            s => Some(s.parse::<civil::Date>().ok()?),
        };
        let cinema = match raw.cinema.trim() {
            "" => None,
            s => Some(s.to_string()),
        };
        Some(Self { scrape_id, day, cinema })
    }
}

/// Keeps rows on or after `today`, optionally narrowed to one exact day.
/// Days are taken at day granularity in each row's own time zone.
pub fn apply_date_filters(
    rows: Vec<Screening>,
    day: Option<civil::Date>,
    today: civil::Date,
) -> Vec<Screening> {
    rows.into_iter()
        .filter(|s| {
            let d = s.date.date();
            d >= today && day.is_none_or(|want| d == want)
        })
        .collect()
}

/// Latest-per-cinema reconciliation: each cinema in scope is served from the
/// batch of its most recently appended row, so independently scheduled
/// scrape runs never mix within one cinema. The result is sorted ascending
/// by date across all cinemas.
///
/// "Most recently appended" means the highest row id, not the numerically
/// largest scrape id.
pub fn latest_per_cinema(
    rows: &[Screening],
    day: Option<civil::Date>,
    cinema: Option<&str>,
    today: civil::Date,
) -> Vec<Screening> {
    let cinemas: Vec<&str> = match cinema {
        Some(c) => vec![c],
        None => distinct_cinemas(rows),
    };

    let mut merged = Vec::new();
    for cinema in cinemas {
        let latest_batch = rows
            .iter()
            .filter(|s| s.cinema == cinema)
            .max_by_key(|s| s.id)
            .map(|s| s.scrape_id);
        let Some(latest_batch) = latest_batch else {
            continue;
        };

        let batch_rows = rows
            .iter()
            .filter(|s| s.cinema == cinema && s.scrape_id == latest_batch)
            .cloned()
            .collect();
        merged.extend(apply_date_filters(batch_rows, day, today));
    }

    sort_by_date(&mut merged);
    merged
}

/// Ascending by instant; ties keep their relative order.
pub fn sort_by_date(rows: &mut [Screening]) {
    rows.sort_by_key(|s| s.date.timestamp());
}

/// Distinct batches (newest first), distinct upcoming days (ascending) and
/// distinct cinema names, all restricted to rows on or after `today`.
pub fn facet_options(rows: &[Screening], today: civil::Date) -> FilterOptions {
    let mut scrape_ids: Vec<i64> = Vec::new();
    let mut dates: Vec<civil::Date> = Vec::new();
    let mut cinemas: Vec<String> = Vec::new();

    for row in rows {
        let day = row.date.date();
        if day < today {
            continue;
        }
        if !scrape_ids.contains(&row.scrape_id) {
            scrape_ids.push(row.scrape_id);
        }
        if !dates.contains(&day) {
            dates.push(day);
        }
        if !cinemas.contains(&row.cinema) {
            cinemas.push(row.cinema.clone());
        }
    }

    scrape_ids.sort_unstable_by(|a, b| b.cmp(a));
    dates.sort_unstable();

    FilterOptions { scrape_ids, dates, cinemas }
}

fn distinct_cinemas(rows: &[Screening]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for row in rows {
        if !out.contains(&row.cinema.as_str()) {
            out.push(&row.cinema);
        }
    }
    out
}
