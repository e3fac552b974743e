use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use futures::future::try_join_all;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::ResolveError,
    models::{
        Genre, Lang, MovieInfo, NO_DESCRIPTION_EN, NO_DESCRIPTION_RU, UNKNOWN_TITLE_EN,
        UNKNOWN_TITLE_RU,
    },
    translate::Translator,
};

const TOP_LISTING_PAGES: u32 = 10;

#[async_trait]
pub trait MovieCatalogue: Send + Sync {
    /// Resolves a free-text query to the single best catalogue match.
    async fn by_keyword(&self, query: &str) -> Result<MovieInfo, ResolveError>;

    /// Uniform random pick from the top listing, filtered by genre.
    async fn random_by_genre(&self, genre: Genre) -> Result<MovieInfo, ResolveError>;
}

pub struct KinopoiskClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    translator: Arc<dyn Translator>,
}

impl KinopoiskClient {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: String,
        rps: u32,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let limiter =
            Arc::new(RateLimiter::direct(Quota::per_second(NonZeroU32::new(rps.max(1)).unwrap())));
        Self { client, api_key, base_url, limiter, translator }
    }

    async fn top_page(&self, page: u32) -> Result<Vec<RawFilm>, ResolveError> {
        self.limiter.until_ready().await;

        let url = format!("{}/api/v2.2/films/top", self.base_url.trim_end_matches('/'));
        let page_str = page.to_string();
        let resp = self
            .client
            .get(url)
            .header("X-API-KEY", &self.api_key)
            .query(&[("type", "TOP_250_BEST_FILMS"), ("page", page_str.as_str())])
            .send()
            .await
            .map_err(|err| ResolveError::GenreScan(format!("page {page}: {err}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResolveError::GenreScan(format!("page {page}: status {status}")));
        }

        let data: TopResponse = resp
            .json()
            .await
            .map_err(|err| ResolveError::GenreScan(format!("page {page}: {err}")))?;
        Ok(data.films)
    }

    async fn translate_or_keep(&self, text: &str) -> String {
        match self.translator.translate(text, Lang::Ru, Lang::En).await {
            Ok(translated) => translated,
            Err(err) => {
                warn!(error = %err, "translation failed, keeping source text");
                text.to_string()
            },
        }
    }

    /// Normalizes a raw catalogue payload, substituting the fixed sentinels
    /// for absent fields. The English description and genres are derived
    /// here, once; cache-hydrated records never re-translate.
    async fn normalize(&self, raw: RawFilm) -> MovieInfo {
        let description_ru = raw
            .description
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION_RU.to_string());
        let description_en = if description_ru == NO_DESCRIPTION_RU {
            NO_DESCRIPTION_EN.to_string()
        } else {
            self.translate_or_keep(&description_ru).await
        };

        let genres_ru: Vec<String> = raw.genres.into_iter().map(|g| g.genre).collect();
        let mut genres_en = Vec::with_capacity(genres_ru.len());
        for genre in &genres_ru {
            genres_en.push(self.translate_or_keep(genre).await);
        }

        MovieInfo {
            kinopoisk_id: raw.kinopoisk_id.or(raw.film_id),
            title_ru: raw
                .name_ru
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE_RU.to_string()),
            title_en: raw
                .name_en
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE_EN.to_string()),
            year: as_i32(&raw.year),
            length: as_text(&raw.film_length),
            description_ru,
            description_en,
            genres_ru,
            genres_en,
            rating: as_f64(&raw.rating),
            poster_url: raw.poster_url.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[async_trait]
impl MovieCatalogue for KinopoiskClient {
    async fn by_keyword(&self, query: &str) -> Result<MovieInfo, ResolveError> {
        self.limiter.until_ready().await;

        let url = format!(
            "{}/api/v2.1/films/search-by-keyword",
            self.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .get(url)
            .header("X-API-KEY", &self.api_key)
            .query(&[("keyword", query), ("page", "1"), ("searchFilmsCountResult", "1")])
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!(status = %resp.status(), query = %query, "keyword search returned non-success");
            return Err(ResolveError::NotFound);
        }

        let data: KeywordSearchResponse = resp.json().await?;
        let Some(raw) = data.films.into_iter().next() else {
            debug!(query = %query, "keyword search returned no films");
            return Err(ResolveError::NotFound);
        };

        Ok(self.normalize(raw).await)
    }

    async fn random_by_genre(&self, genre: Genre) -> Result<MovieInfo, ResolveError> {
        let pages =
            try_join_all((1..=TOP_LISTING_PAGES).map(|page| self.top_page(page))).await?;

        let mut pool: Vec<RawFilm> = pages
            .into_iter()
            .flatten()
            .filter(|film| matches_genre(film, genre))
            .collect();

        debug!(genre = genre.name_ru(), pool = pool.len(), "top listing scan complete");

        if pool.is_empty() {
            return Err(ResolveError::NotFound);
        }
        let idx = rand::rng().random_range(0..pool.len());
        let raw = pool.swap_remove(idx);

        Ok(self.normalize(raw).await)
    }
}

fn matches_genre(film: &RawFilm, genre: Genre) -> bool {
    film.genres.iter().any(|g| g.genre == genre.name_ru())
}

// The API is loose with scalar types: year and rating arrive as numbers or
// strings (sometimes the literal string "null") depending on the endpoint
// version.
fn as_f64(value: &Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn as_i32(value: &Option<Value>) -> Option<i32> {
    match value {
        Some(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() && s != "null" => Some(s.clone()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct KeywordSearchResponse {
    #[serde(default)]
    films: Vec<RawFilm>,
}

#[derive(Debug, Deserialize)]
struct TopResponse {
    #[serde(default)]
    films: Vec<RawFilm>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilm {
    #[serde(default)]
    film_id: Option<i64>,
    #[serde(default)]
    kinopoisk_id: Option<i64>,
    #[serde(default)]
    name_ru: Option<String>,
    #[serde(default)]
    name_en: Option<String>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    film_length: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    genres: Vec<RawGenre>,
    #[serde(default)]
    rating: Option<Value>,
    #[serde(default)]
    poster_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGenre {
    genre: String,
}
