use async_trait::async_trait;
use jiff::{Zoned, civil, tz::TimeZone};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::screening,
    error::StorageError,
    models::{Filter, FilterOptions, NewScreening, Screening},
    reconcile::{self, ParsedFilter},
};

/// Capability surface of the screening store. The SQL-backed implementation
/// is one conforming variant; tests run against an in-memory fake.
#[async_trait]
pub trait ScreeningRepo: Send + Sync {
    /// Appends one record. No deduplication, no upsert.
    async fn insert(&self, screening: NewScreening) -> Result<(), StorageError>;

    /// Every stored record, in storage order.
    async fn query_all(&self) -> Result<Vec<Screening>, StorageError>;

    /// With a scrape id: that batch, floored to today-or-later, optionally
    /// narrowed by day and cinema. Without one: each cinema in scope served
    /// from the batch of its most recently appended row, merged and sorted
    /// ascending by date.
    async fn query_with_filter(&self, filter: &Filter) -> Result<Vec<Screening>, StorageError>;

    /// Distinct batches, upcoming days and cinemas available for filtering.
    async fn filter_options(&self) -> Result<FilterOptions, StorageError>;
}

#[derive(Clone)]
pub struct SqliteRepo {
    db: DatabaseConnection,
    tz: TimeZone,
}

impl SqliteRepo {
    pub fn new(db: DatabaseConnection, tz: TimeZone) -> Self {
        Self { db, tz }
    }

    fn today(&self) -> civil::Date {
        Zoned::now().with_time_zone(self.tz.clone()).date()
    }

    async fn distinct_cinemas(&self) -> Result<Vec<String>, StorageError> {
        let cinemas = screening::Entity::find()
            .select_only()
            .column(screening::Column::Cinema)
            .distinct()
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(cinemas)
    }

    /// Scrape id of the most recently appended row for a cinema, by row id,
    /// not by scrape id magnitude.
    async fn latest_scrape_id(&self, cinema: &str) -> Result<Option<i64>, StorageError> {
        let last = screening::Entity::find()
            .filter(screening::Column::Cinema.eq(cinema))
            .order_by_desc(screening::Column::Id)
            .one(&self.db)
            .await?;
        Ok(last.map(|row| row.scrape_id))
    }
}

#[async_trait]
impl ScreeningRepo for SqliteRepo {
    async fn insert(&self, screening: NewScreening) -> Result<(), StorageError> {
        let model = screening::ActiveModel {
            id: Default::default(),
            scrape_id: Set(screening.scrape_id),
            title: Set(screening.title),
            date: Set(screening.date.to_string()),
            duration: Set(screening.duration),
            cinema: Set(screening.cinema),
            thumbnail_url: Set(screening.thumbnail_url),
            description: Set(screening.description),
            link: Set(screening.link),
        };
        screening::Entity::insert(model).exec(&self.db).await?;
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Screening>, StorageError> {
        let rows = screening::Entity::find().all(&self.db).await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn query_with_filter(&self, filter: &Filter) -> Result<Vec<Screening>, StorageError> {
        let Some(parsed) = ParsedFilter::parse(filter) else {
            return Ok(Vec::new());
        };
        let today = self.today();

        if let Some(scrape_id) = parsed.scrape_id {
            let mut query =
                screening::Entity::find().filter(screening::Column::ScrapeId.eq(scrape_id));
            if let Some(cinema) = parsed.cinema.as_deref() {
                query = query.filter(screening::Column::Cinema.eq(cinema));
            }
            let rows = query
                .all(&self.db)
                .await?
                .into_iter()
                .map(from_row)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(reconcile::apply_date_filters(rows, parsed.day, today));
        }

        let cinemas = match &parsed.cinema {
            Some(cinema) => vec![cinema.clone()],
            None => self.distinct_cinemas().await?,
        };

        let mut merged = Vec::new();
        for cinema in &cinemas {
            let Some(scrape_id) = self.latest_scrape_id(cinema).await? else {
                continue;
            };
            let rows = screening::Entity::find()
                .filter(screening::Column::Cinema.eq(cinema.as_str()))
                .filter(screening::Column::ScrapeId.eq(scrape_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(from_row)
                .collect::<Result<Vec<_>, _>>()?;
            merged.extend(reconcile::apply_date_filters(rows, parsed.day, today));
        }

        reconcile::sort_by_date(&mut merged);
        Ok(merged)
    }

    async fn filter_options(&self) -> Result<FilterOptions, StorageError> {
        let rows = self.query_all().await?;
        Ok(reconcile::facet_options(&rows, self.today()))
    }
}

fn from_row(row: screening::Model) -> Result<Screening, StorageError> {
    let date: Zoned = row
        .date
        .parse()
        .map_err(|err: jiff::Error| StorageError::Corrupt { id: row.id, reason: err.to_string() })?;
    Ok(Screening {
        id: row.id,
        scrape_id: row.scrape_id,
        title: row.title,
        date,
        duration: row.duration,
        cinema: row.cinema,
        thumbnail_url: row.thumbnail_url,
        description: row.description,
        link: row.link,
    })
}

/// In-memory fake conforming to the same contract as [`SqliteRepo`],
/// through the same pure reconciliation functions.
#[cfg(test)]
#[derive(Clone)]
pub struct MemoryRepo {
    rows: std::sync::Arc<std::sync::Mutex<Vec<Screening>>>,
    tz: TimeZone,
}

#[cfg(test)]
impl MemoryRepo {
    pub fn new(tz: TimeZone) -> Self {
        Self { rows: Default::default(), tz }
    }

    fn today(&self) -> civil::Date {
        Zoned::now().with_time_zone(self.tz.clone()).date()
    }
}

#[cfg(test)]
#[async_trait]
impl ScreeningRepo for MemoryRepo {
    async fn insert(&self, screening: NewScreening) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.last().map_or(1, |s| s.id + 1);
        rows.push(Screening {
            id,
            scrape_id: screening.scrape_id,
            title: screening.title,
            date: screening.date,
            duration: screening.duration,
            cinema: screening.cinema,
            thumbnail_url: screening.thumbnail_url,
            description: screening.description,
            link: screening.link,
        });
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Screening>, StorageError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn query_with_filter(&self, filter: &Filter) -> Result<Vec<Screening>, StorageError> {
        let Some(parsed) = ParsedFilter::parse(filter) else {
            return Ok(Vec::new());
        };
        let rows = self.rows.lock().unwrap().clone();
        let today = self.today();

        if let Some(scrape_id) = parsed.scrape_id {
            let rows = rows
                .into_iter()
                .filter(|s| s.scrape_id == scrape_id)
                .filter(|s| parsed.cinema.as_deref().is_none_or(|c| s.cinema == c))
                .collect();
            return Ok(reconcile::apply_date_filters(rows, parsed.day, today));
        }

        Ok(reconcile::latest_per_cinema(&rows, parsed.day, parsed.cinema.as_deref(), today))
    }

    async fn filter_options(&self) -> Result<FilterOptions, StorageError> {
        let rows = self.rows.lock().unwrap().clone();
        Ok(reconcile::facet_options(&rows, self.today()))
    }
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;

    use super::*;
    use crate::db;

    fn berlin() -> TimeZone {
        TimeZone::get("Europe/Berlin").unwrap()
    }

    fn days_from_now(days: i64) -> Zoned {
        Zoned::now().with_time_zone(berlin()) + days.days()
    }

    fn record(scrape_id: i64, cinema: &str, title: &str, date: Zoned) -> NewScreening {
        NewScreening {
            scrape_id,
            title: title.to_string(),
            date,
            duration: 90,
            cinema: cinema.to_string(),
            thumbnail_url: "https://example.org/thumb.jpg".to_string(),
            description: String::new(),
            link: "https://example.org/film".to_string(),
        }
    }

    async fn sqlite_repo() -> SqliteRepo {
        let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();
        SqliteRepo::new(db, berlin())
    }

    fn titles(rows: &[Screening]) -> Vec<&str> {
        rows.iter().map(|s| s.title.as_str()).collect()
    }

    #[tokio::test]
    async fn round_trips_a_batch() {
        let repo = sqlite_repo().await;
        for i in 0..3_i64 {
            repo.insert(record(7, "Kino Babylon", &format!("film-{i}"), days_from_now(i + 1)))
                .await
                .unwrap();
        }
        repo.insert(record(8, "Kino Babylon", "other-batch", days_from_now(1))).await.unwrap();

        let filter = Filter { scrape_id: "7".to_string(), ..Filter::default() };
        let rows = repo.query_with_filter(&filter).await.unwrap();

        let mut got = titles(&rows);
        got.sort_unstable();
        assert_eq!(got, ["film-0", "film-1", "film-2"]);
        assert!(rows.iter().all(|s| s.scrape_id == 7));
    }

    #[tokio::test]
    async fn empty_filter_reconciles_latest_batch_per_cinema() {
        let repo = sqlite_repo().await;
        repo.insert(record(1, "A", "a-old", days_from_now(2))).await.unwrap();
        repo.insert(record(1, "B", "b-old", days_from_now(2))).await.unwrap();
        repo.insert(record(3, "B", "b-new-late", days_from_now(3))).await.unwrap();
        repo.insert(record(3, "B", "b-new-early", days_from_now(1))).await.unwrap();
        repo.insert(record(5, "A", "a-new", days_from_now(2))).await.unwrap();

        let rows = repo.query_with_filter(&Filter::default()).await.unwrap();

        assert_eq!(titles(&rows), ["b-new-early", "a-new", "b-new-late"]);
    }

    #[tokio::test]
    async fn latest_means_last_inserted_not_largest_scrape_id() {
        let repo = sqlite_repo().await;
        repo.insert(record(9, "A", "from-batch-9", days_from_now(1))).await.unwrap();
        repo.insert(record(2, "A", "from-batch-2", days_from_now(1))).await.unwrap();

        let rows = repo.query_with_filter(&Filter::default()).await.unwrap();

        assert_eq!(titles(&rows), ["from-batch-2"]);
    }

    #[tokio::test]
    async fn batch_queries_floor_out_past_screenings() {
        let repo = sqlite_repo().await;
        repo.insert(record(7, "A", "yesterday", days_from_now(-1))).await.unwrap();
        repo.insert(record(7, "A", "tomorrow", days_from_now(1))).await.unwrap();

        let filter = Filter { scrape_id: "7".to_string(), ..Filter::default() };
        let rows = repo.query_with_filter(&filter).await.unwrap();

        assert_eq!(titles(&rows), ["tomorrow"]);
    }

    #[tokio::test]
    async fn day_filter_narrows_to_one_day() {
        let repo = sqlite_repo().await;
        repo.insert(record(1, "A", "tomorrow", days_from_now(1))).await.unwrap();
        repo.insert(record(1, "A", "day-after", days_from_now(2))).await.unwrap();

        let filter =
            Filter { date: days_from_now(1).date().to_string(), ..Filter::default() };
        let rows = repo.query_with_filter(&filter).await.unwrap();

        assert_eq!(titles(&rows), ["tomorrow"]);
    }

    #[tokio::test]
    async fn cinema_filter_limits_scope() {
        let repo = sqlite_repo().await;
        repo.insert(record(1, "A", "at-a", days_from_now(1))).await.unwrap();
        repo.insert(record(2, "B", "at-b", days_from_now(1))).await.unwrap();

        let filter = Filter { cinema: "B".to_string(), ..Filter::default() };
        let rows = repo.query_with_filter(&filter).await.unwrap();

        assert_eq!(titles(&rows), ["at-b"]);
    }

    #[tokio::test]
    async fn facets_cover_upcoming_rows_only() {
        let repo = sqlite_repo().await;
        repo.insert(record(1, "A", "gone", days_from_now(-1))).await.unwrap();
        repo.insert(record(1, "A", "tonight", days_from_now(0))).await.unwrap();
        repo.insert(record(2, "B", "tomorrow", days_from_now(1))).await.unwrap();
        repo.insert(record(2, "B", "tomorrow-too", days_from_now(1))).await.unwrap();

        let options = repo.filter_options().await.unwrap();

        assert_eq!(options.scrape_ids, [2, 1]);
        assert_eq!(options.dates, [days_from_now(0).date(), days_from_now(1).date()]);
        assert_eq!(options.cinemas, ["A", "B"]);
    }

    #[tokio::test]
    async fn query_all_is_idempotent() {
        let repo = sqlite_repo().await;
        repo.insert(record(1, "A", "one", days_from_now(1))).await.unwrap();
        repo.insert(record(1, "A", "two", days_from_now(2))).await.unwrap();

        let first = repo.query_all().await.unwrap();
        let second = repo.query_all().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unparseable_filter_matches_nothing() {
        let repo = sqlite_repo().await;
        repo.insert(record(1, "A", "one", days_from_now(1))).await.unwrap();

        let bad_id = Filter { scrape_id: "not-a-number".to_string(), ..Filter::default() };
        assert!(repo.query_with_filter(&bad_id).await.unwrap().is_empty());

        let bad_date = Filter { date: "morgen".to_string(), ..Filter::default() };
        assert!(repo.query_with_filter(&bad_date).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_repo_conforms_to_the_same_contract() {
        let repo = MemoryRepo::new(berlin());
        repo.insert(record(1, "A", "a-old", days_from_now(2))).await.unwrap();
        repo.insert(record(3, "B", "b-new", days_from_now(1))).await.unwrap();
        repo.insert(record(5, "A", "a-new", days_from_now(2))).await.unwrap();

        let rows = repo.query_with_filter(&Filter::default()).await.unwrap();
        assert_eq!(titles(&rows), ["b-new", "a-new"]);

        let options = repo.filter_options().await.unwrap();
        assert_eq!(options.scrape_ids, [5, 3, 1]);
        assert_eq!(options.cinemas, ["A", "B"]);
    }
}
