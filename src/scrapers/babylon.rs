use async_trait::async_trait;
use jiff::tz::TimeZone;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::{
    datetime::{self, DateSequence},
    error::ScrapeError,
    models::{KINO_BABYLON, NewScreening},
    repository::ScreeningRepo,
    scrapers::SourceAdapter,
};

/// Scrapes the programme page of the Babylon cinema. The page is one flat
/// markup list; title, date and runtime sit in structural child nodes of
/// each entry.
pub struct Babylon<R> {
    http: reqwest::Client,
    repo: R,
    base_url: String,
    tz: TimeZone,
}

impl<R> Babylon<R> {
    pub fn new(http: reqwest::Client, repo: R, base_url: String, tz: TimeZone) -> Self {
        Self { http, repo, base_url, tz }
    }
}

#[async_trait]
impl<R: ScreeningRepo> SourceAdapter for Babylon<R> {
    fn name(&self) -> &'static str {
        "babylon"
    }

    async fn run(&self) -> Result<(), ScrapeError> {
        let url = format!("{}/programm", self.base_url);
        debug!(url = %url, "fetching programme page");
        let html = self.http.get(&url).send().await?.error_for_status()?.text().await?;

        let scrape_id = jiff::Timestamp::now().as_second();
        let screenings = parse_programme(&html, &self.base_url, scrape_id, &self.tz)?;
        debug!(count = screenings.len(), scrape_id, "parsed programme");

        for screening in screenings {
            self.repo.insert(screening).await?;
        }
        Ok(())
    }
}

fn parse_programme(
    html: &str,
    base_url: &str,
    scrape_id: i64,
    tz: &TimeZone,
) -> Result<Vec<NewScreening>, ScrapeError> {
    let container_sel = Selector::parse("#regridart-207").unwrap();
    let item_sel = Selector::parse("li").unwrap();
    let title_sel = Selector::parse("h3").unwrap();
    let date_sel = Selector::parse(".mix-date").unwrap();
    let runtime_sel = Selector::parse(".runtime").unwrap();
    let link_sel = Selector::parse(".mix-title").unwrap();
    let thumb_sel = Selector::parse(".fancybox").unwrap();

    let doc = Html::parse_document(html);
    let container = doc
        .select(&container_sel)
        .next()
        .ok_or_else(|| ScrapeError::Structure("programme container not found".to_string()))?;

    let mut dates = DateSequence::new(tz.clone());
    let mut out = Vec::new();

    for item in container.select(&item_sel) {
        let titles: Vec<String> = item.select(&title_sel).map(element_text).collect();
        // entries with fewer than three title nodes are separators or
        // incomplete teasers
        if titles.len() <= 2 {
            continue;
        }
        let title = titles[2].clone();

        let Some(date_text) = item.select(&date_sel).next().map(element_text) else {
            warn!(title = %title, "screening without date node, skipping");
            continue;
        };
        let date = match dates.parse(&date_text) {
            Ok(date) => date,
            Err(err) => {
                warn!(title = %title, error = %err, "could not parse date, skipping");
                continue;
            }
        };

        let duration = match item.select(&runtime_sel).next().map(element_text) {
            Some(text) => datetime::parse_duration(&text).unwrap_or_else(|err| {
                warn!(title = %title, error = %err, "could not parse duration");
                0
            }),
            None => 0,
        };

        let link = item
            .select(&link_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|href| format!("{base_url}{href}"))
            .unwrap_or_default();
        let thumbnail_url = item
            .select(&thumb_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        out.push(NewScreening {
            scrape_id,
            title,
            date,
            duration,
            cinema: KINO_BABYLON.to_string(),
            thumbnail_url,
            description: String::new(),
            link,
        });
    }

    Ok(out)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
