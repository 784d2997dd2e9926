use std::net::SocketAddr;

use anyhow::Context;
use jiff::tz::TimeZone;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub babylon_base_url: String,
    pub yorck_base_url: String,
    pub fetch_timeout_secs: u64,
    pub tz: TimeZone,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8081".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://screenings.db?mode=rwc".to_string());

        let babylon_base_url = std::env::var("BABYLON_BASE_URL")
            .unwrap_or_else(|_| "https://babylonberlin.eu".to_string());

        let yorck_base_url = std::env::var("YORCK_BASE_URL")
            .unwrap_or_else(|_| "https://www.yorck.de/filme".to_string());

        let fetch_timeout_secs: u64 =
            std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(30);

        let tz_name =
            std::env::var("CINEMA_TIMEZONE").unwrap_or_else(|_| "Europe/Berlin".to_string());
        let tz = TimeZone::get(&tz_name).context("CINEMA_TIMEZONE")?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            babylon_base_url,
            yorck_base_url,
            fetch_timeout_secs,
            tz,
        })
    }
}
