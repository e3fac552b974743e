mod config;
mod db;
mod entities;
mod error;
mod kinopoisk;
mod models;
mod pipeline;
mod ranker;
mod routes;
mod search;
mod store;
mod translate;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post, put},
};
use moka::future::Cache;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config, kinopoisk::KinopoiskClient, pipeline::Pipeline, search::GoogleSearcher,
    store::Store, translate::HttpTranslator,
};

// The search engine serves usable HTML to browser user-agents only.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_5) \
     AppleWebKit/537.36 (KHTML, like Gecko) Safari/537.36";

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub pipeline: Arc<Pipeline>,
    pub rating_tokens: Cache<String, String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,kinolink=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Store::new(db);

    let translator = Arc::new(HttpTranslator::new(http.clone(), config.translate_base_url.clone()));
    let catalogue = Arc::new(KinopoiskClient::new(
        http.clone(),
        config.kinopoisk_api_key.clone(),
        config.kinopoisk_base_url.clone(),
        config.kinopoisk_rps,
        translator,
    ));
    let searcher =
        Arc::new(GoogleSearcher::new(http.clone(), config.search_pages, config.max_candidates));

    let pipeline = Arc::new(Pipeline::new(store.clone(), catalogue, searcher));

    let rating_tokens = Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(config.rating_token_ttl_secs))
        .build();

    let state = Arc::new(AppState { store, pipeline, rating_tokens });

    let app = Router::new()
        .route("/api/resolve", post(routes::resolve))
        .route("/api/random", post(routes::random))
        .route("/api/genres", get(routes::genres))
        .route("/api/history/{user_id}", get(routes::history))
        .route("/api/stats/{user_id}", get(routes::stats))
        .route("/api/language", put(routes::language))
        .route("/api/rating", post(routes::rate))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
