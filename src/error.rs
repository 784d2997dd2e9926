use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Failure to make sense of a single extracted item. Non-fatal: the caller
/// skips the item or defaults the affected field and keeps going.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed date string {input:?}")]
    Date { input: String },
    #[error("malformed duration string {input:?}")]
    Duration { input: String },
}

impl ParseError {
    pub fn date(input: &str) -> Self {
        Self::Date { input: input.to_string() }
    }

    pub fn duration(input: &str) -> Self {
        Self::Duration { input: input.to_string() }
    }
}

/// Storage operations always report their outcome; nothing is swallowed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
    #[error("stored row {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Failure that aborts one scraper run. Other sources are unaffected.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("unexpected page structure: {0}")]
    Structure(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = crate::templates::error_page(self.to_string());
        Html(body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
