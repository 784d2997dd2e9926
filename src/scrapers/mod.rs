//! Source adapters. Each adapter turns one cinema website into canonical
//! screening records and appends them to the store under a single per-run
//! scrape id.

pub mod babylon;
pub mod yorck;

use async_trait::async_trait;
use tracing::{error, info};

use crate::{config::Config, error::ScrapeError, repository::ScreeningRepo};

/// One scraping source: a single fetch, one extraction pass, sequential
/// inserts. Every record of one `run` shares one scrape id.
#[async_trait]
pub trait SourceAdapter {
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<(), ScrapeError>;
}

/// Runs every registered source once. A failing source is logged and does
/// not keep the remaining sources from running.
pub async fn run_all<R>(http: &reqwest::Client, repo: &R, config: &Config)
where
    R: ScreeningRepo + Clone,
{
    let babylon = babylon::Babylon::new(
        http.clone(),
        repo.clone(),
        config.babylon_base_url.clone(),
        config.tz.clone(),
    );
    run_logged(&babylon).await;

    let yorck = yorck::Yorck::new(
        http.clone(),
        repo.clone(),
        config.yorck_base_url.clone(),
        config.tz.clone(),
    );
    run_logged(&yorck).await;
}

async fn run_logged(source: &(impl SourceAdapter + Sync)) {
    match source.run().await {
        Ok(()) => info!(source = source.name(), "scrape succeeded"),
        Err(err) => error!(source = source.name(), error = %err, "scrape failed"),
    }
}
