use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub kinopoisk_api_key: String,
    pub kinopoisk_base_url: String,
    pub kinopoisk_rps: u32,
    pub translate_base_url: String,
    pub search_pages: usize,
    pub max_candidates: usize,
    pub rating_token_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://kinolink.db?mode=rwc".to_string());

        let kinopoisk_api_key =
            std::env::var("KINOPOISK_API_KEY").context("KINOPOISK_API_KEY")?;
        let kinopoisk_base_url = std::env::var("KINOPOISK_BASE_URL")
            .unwrap_or_else(|_| "https://kinopoiskapiunofficial.tech".to_string());

        let kinopoisk_rps: u32 =
            std::env::var("KINOPOISK_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let translate_base_url = std::env::var("TRANSLATE_BASE_URL")
            .unwrap_or_else(|_| "https://libretranslate.de".to_string());

        let search_pages: usize =
            std::env::var("SEARCH_PAGES").ok().and_then(|s| s.parse().ok()).unwrap_or(7);

        let max_candidates: usize =
            std::env::var("MAX_CANDIDATES").ok().and_then(|s| s.parse().ok()).unwrap_or(30);

        let rating_token_ttl_secs: u64 = std::env::var("RATING_TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            kinopoisk_api_key,
            kinopoisk_base_url,
            kinopoisk_rps,
            translate_base_url,
            search_pages,
            max_candidates,
            rating_token_ttl_secs,
        })
    }
}
