use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppResult, ResolveError},
    models::{Genre, Lang, Resolution},
};

fn msg_not_found(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "фильм не найден",
        Lang::En => "movie not found",
    }
}

fn msg_link_missing(lang: Lang) -> &'static str {
    match lang {
        Lang::Ru => "ссылка на фильм не найдена",
        Lang::En => "watch link not found",
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub user_id: i64,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub title: String,
    pub caption: String,
    pub link: Option<String>,
    pub canonical_title: String,
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub rating_token: String,
    pub note: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> AppResult<Response> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Ok(bad_request("query is required"));
    }

    let lang = state.store.user_lang(req.user_id).await?;
    info!(user_id = req.user_id, query = %query, "resolve request");

    match state.pipeline.resolve(req.user_id, &query, lang).await {
        Ok(res) => Ok(Json(resolution_response(&state, res, lang).await).into_response()),
        Err(err) => Ok(failed_response(err, lang)),
    }
}

#[derive(Debug, Deserialize)]
pub struct RandomRequest {
    pub user_id: i64,
    pub genre: String,
}

pub async fn random(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RandomRequest>,
) -> AppResult<Response> {
    let Some(genre) = Genre::from_name(&req.genre) else {
        return Ok(bad_request("unknown genre"));
    };

    let lang = state.store.user_lang(req.user_id).await?;
    info!(user_id = req.user_id, genre = genre.name_ru(), "random movie request");

    match state.pipeline.resolve_random_by_genre(req.user_id, genre, lang).await {
        Ok(res) => Ok(Json(resolution_response(&state, res, lang).await).into_response()),
        Err(err) => Ok(failed_response(err, lang)),
    }
}

pub async fn genres() -> Json<serde_json::Value> {
    let genres: Vec<_> = Genre::ALL
        .into_iter()
        .map(|g| json!({ "name_ru": g.name_ru(), "name_en": g.name_en() }))
        .collect();
    Json(json!({ "genres": genres }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u64,
}

fn default_history_limit() -> u64 {
    10
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let rows = state.store.history(user_id, q.limit).await?;
    let entries: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let timestamp = jiff::Timestamp::from_second(row.created_at)
                .map(|t| t.to_string())
                .unwrap_or_default();
            json!({
                "query": row.query,
                "movie_name": row.movie_name,
                "timestamp": timestamp,
            })
        })
        .collect();
    Ok(Json(json!({ "history": entries })))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let rows = state.store.stats(user_id).await?;
    let entries: Vec<_> = rows
        .into_iter()
        .map(|row| {
            json!({
                "movie_name": row.movie_name,
                "count": row.count,
                "rating": row.rating,
            })
        })
        .collect();
    Ok(Json(json!({ "stats": entries })))
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub user_id: i64,
    pub lang: Lang,
}

pub async fn language(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LanguageRequest>,
) -> AppResult<Json<serde_json::Value>> {
    state.store.set_lang(req.user_id, req.lang).await?;
    Ok(Json(json!({ "user_id": req.user_id, "lang": req.lang })))
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub user_id: i64,
    pub token: String,
    pub rating: u8,
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RatingRequest>,
) -> AppResult<Response> {
    if !(1..=10).contains(&req.rating) {
        return Ok(bad_request("rating must be between 1 and 10"));
    }

    let Some(movie_name) = state.rating_tokens.get(&req.token).await else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "rating window expired" })),
        )
            .into_response());
    };

    let updated = state.store.set_rating(req.user_id, &movie_name, req.rating as f64).await?;
    Ok(Json(json!({ "movie_name": movie_name, "updated": updated })).into_response())
}

async fn resolution_response(state: &AppState, res: Resolution, lang: Lang) -> ResolveResponse {
    // short-lived handle for the out-of-band rating action
    let token = Uuid::new_v4().to_string();
    state.rating_tokens.insert(token.clone(), res.canonical_title.clone()).await;

    let note = res.link.is_none().then(|| msg_link_missing(lang).to_string());

    ResolveResponse {
        title: res.movie.title_for(lang).to_string(),
        caption: res.movie.caption(lang),
        link: res.link.as_deref().map(clean_link),
        canonical_title: res.canonical_title,
        poster_url: res.movie.poster_url.clone(),
        year: res.movie.year,
        rating: res.movie.rating,
        rating_token: token,
        note,
    }
}

fn failed_response(err: ResolveError, lang: Lang) -> Response {
    tracing::warn!(error = %err, "resolution failed");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": msg_not_found(lang) })),
    )
        .into_response()
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

/// Search-engine result hrefs often wrap the target
/// (`/url?q=https://site&sa=...`); keep the embedded URL only.
fn clean_link(link: &str) -> String {
    let start = link.find("http").unwrap_or(0);
    let link = &link[start..];
    link.split('&').next().unwrap_or(link).to_string()
}
