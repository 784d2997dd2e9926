mod config;
mod datetime;
mod db;
mod entities;
mod error;
mod models;
mod reconcile;
mod repository;
mod routes;
mod scrapers;
mod templates;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{config::Config, repository::SqliteRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: SqliteRepo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,kinoplan=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("kinoplan/0.1")
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let repo = SqliteRepo::new(db, config.tz.clone());

    if std::env::args().nth(1).as_deref() == Some("scrape") {
        scrapers::run_all(&http, &repo, &config).await;
        return Ok(());
    }

    let state = Arc::new(AppState { config: config.clone(), repo });

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/api/selects", get(routes::selects))
        .route("/api/screenings", post(routes::screenings))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
        ))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
