use async_trait::async_trait;
use jiff::{Timestamp, tz::TimeZone};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::ScrapeError, models::NewScreening, repository::ScreeningRepo, scrapers::SourceAdapter,
};

const SCRIPT_BEGIN: &str = r#"<script id="__NEXT_DATA__" type="application/json">"#;
const SCRIPT_END: &str = "</script>";

/// Scrapes the Yorck group programme. The page embeds its complete film data
/// as a JSON document inside a script tag; sessions are flattened to one
/// record per (film, session) pair.
pub struct Yorck<R> {
    http: reqwest::Client,
    repo: R,
    base_url: String,
    tz: TimeZone,
}

impl<R> Yorck<R> {
    pub fn new(http: reqwest::Client, repo: R, base_url: String, tz: TimeZone) -> Self {
        Self { http, repo, base_url, tz }
    }
}

#[async_trait]
impl<R: ScreeningRepo> SourceAdapter for Yorck<R> {
    fn name(&self) -> &'static str {
        "yorck"
    }

    async fn run(&self) -> Result<(), ScrapeError> {
        debug!(url = %self.base_url, "fetching film data page");
        let body = self.http.get(&self.base_url).send().await?.error_for_status()?.text().await?;

        let scrape_id = Timestamp::now().as_second();
        let screenings = parse_films(&body, &self.base_url, scrape_id, &self.tz)?;
        debug!(count = screenings.len(), scrape_id, "extracted film data");

        for screening in screenings {
            self.repo.insert(screening).await?;
        }
        Ok(())
    }
}

// The structs mirror the exact field paths of the embedded document, so any
// shape drift fails the whole run instead of yielding zeroed fields.

#[derive(Debug, Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Debug, Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    films: Vec<Film>,
}

#[derive(Debug, Deserialize)]
struct Film {
    fields: FilmFields,
}

#[derive(Debug, Deserialize)]
struct FilmFields {
    title: String,
    runtime: i32,
    slug: String,
    sessions: Vec<Session>,
    #[serde(rename = "heroImage")]
    hero_image: HeroImage,
}

#[derive(Debug, Deserialize)]
struct Session {
    fields: SessionFields,
}

#[derive(Debug, Deserialize)]
struct SessionFields {
    #[serde(rename = "startTime")]
    start_time: Timestamp,
    cinema: Cinema,
}

#[derive(Debug, Deserialize)]
struct Cinema {
    fields: CinemaFields,
}

#[derive(Debug, Deserialize)]
struct CinemaFields {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HeroImage {
    fields: HeroImageFields,
}

#[derive(Debug, Deserialize)]
struct HeroImageFields {
    image: Image,
}

#[derive(Debug, Deserialize)]
struct Image {
    fields: ImageFields,
}

#[derive(Debug, Deserialize)]
struct ImageFields {
    file: ImageFile,
}

#[derive(Debug, Deserialize)]
struct ImageFile {
    url: String,
}

fn extract_payload(body: &str) -> Result<&str, ScrapeError> {
    let begin = body
        .find(SCRIPT_BEGIN)
        .ok_or_else(|| ScrapeError::Structure("begin of film data not found".to_string()))?
        + SCRIPT_BEGIN.len();
    let end = body[begin..]
        .find(SCRIPT_END)
        .ok_or_else(|| ScrapeError::Structure("end of film data not found".to_string()))?;
    Ok(&body[begin..begin + end])
}

fn parse_films(
    body: &str,
    base_url: &str,
    scrape_id: i64,
    tz: &TimeZone,
) -> Result<Vec<NewScreening>, ScrapeError> {
    let payload = extract_payload(body)?;
    let data: NextData = serde_json::from_str(payload)
        .map_err(|err| ScrapeError::Structure(format!("film data does not match schema: {err}")))?;

    let mut out = Vec::new();
    for film in data.props.page_props.films {
        let fields = film.fields;
        for session in fields.sessions {
            out.push(NewScreening {
                scrape_id,
                title: fields.title.clone(),
                date: session.fields.start_time.to_zoned(tz.clone()),
                duration: fields.runtime,
                cinema: session.fields.cinema.fields.name,
                thumbnail_url: format!(
                    "https:{}?w=480&q=75",
                    fields.hero_image.fields.image.fields.file.url
                ),
                description: String::new(),
                link: format!("{}/{}", base_url, fields.slug),
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.yorck.de/filme";

    fn tz() -> TimeZone {
        TimeZone::get("Europe/Berlin").unwrap()
    }

    fn payload() -> &'static str {
        r#"{
            "props": {"pageProps": {"films": [
                {"fields": {
                    "title": "Paris, Texas",
                    "runtime": 145,
                    "slug": "paris-texas",
                    "heroImage": {"fields": {"image": {"fields": {"file": {"url": "//images.example/paris.jpg"}}}}},
                    "sessions": [
                        {"fields": {"startTime": "2031-06-17T19:30:00Z", "cinema": {"fields": {"name": "Babylon Kreuzberg"}}}},
                        {"fields": {"startTime": "2031-06-18T21:00:00Z", "cinema": {"fields": {"name": "Yorck"}}}}
                    ]
                }}
            ]}}
        }"#
    }

    fn page(payload: &str) -> String {
        format!("<html><head>{SCRIPT_BEGIN}{payload}{SCRIPT_END}</head><body></body></html>")
    }

    #[test]
    fn flattens_film_sessions() {
        let out = parse_films(&page(payload()), BASE, 99, &tz()).unwrap();

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.scrape_id == 99 && s.title == "Paris, Texas"));
        assert_eq!(out[0].cinema, "Babylon Kreuzberg");
        assert_eq!(out[1].cinema, "Yorck");
        assert_eq!(out[0].duration, 145);
        assert_eq!(out[0].link, "https://www.yorck.de/filme/paris-texas");
        assert_eq!(out[0].thumbnail_url, "https://images.example/paris.jpg?w=480&q=75");
    }

    #[test]
    fn session_times_are_resolved_to_local_time() {
        let out = parse_films(&page(payload()), BASE, 1, &tz()).unwrap();

        // 19:30 UTC is 21:30 in Berlin during daylight saving time
        assert_eq!((out[0].date.hour(), out[0].date.minute()), (21, 30));
    }

    #[test]
    fn missing_begin_marker_is_fatal() {
        let err = parse_films("<html><body></body></html>", BASE, 1, &tz()).unwrap_err();

        assert!(matches!(err, ScrapeError::Structure(_)));
    }

    #[test]
    fn missing_end_marker_is_fatal() {
        let body = format!("<html>{SCRIPT_BEGIN}{{}}");

        let err = parse_films(&body, BASE, 1, &tz()).unwrap_err();

        assert!(matches!(err, ScrapeError::Structure(_)));
    }

    #[test]
    fn schema_drift_is_fatal() {
        let err = parse_films(&page(r#"{"props": {}}"#), BASE, 1, &tz()).unwrap_err();

        assert!(matches!(err, ScrapeError::Structure(_)));
    }
}
