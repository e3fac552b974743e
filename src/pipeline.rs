use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::ResolveError,
    kinopoisk::MovieCatalogue,
    models::{Genre, Lang, MovieInfo, Resolution},
    ranker,
    search::LinkSearcher,
    store::Store,
};

/// Orchestrates one resolution run: cache check, metadata fetch, link
/// discovery, persistence. Holds no state between runs; concurrent runs only
/// share the store.
pub struct Pipeline {
    store: Store,
    catalogue: Arc<dyn MovieCatalogue>,
    searcher: Arc<dyn LinkSearcher>,
}

impl Pipeline {
    pub fn new(
        store: Store,
        catalogue: Arc<dyn MovieCatalogue>,
        searcher: Arc<dyn LinkSearcher>,
    ) -> Self {
        Self { store, catalogue, searcher }
    }

    pub async fn resolve(
        &self,
        user_id: i64,
        query: &str,
        lang: Lang,
    ) -> Result<Resolution, ResolveError> {
        let cached = match self.store.get_movie(query).await {
            Ok(cached) => cached,
            Err(err) => {
                warn!(query = %query, error = %err, "cache lookup failed, treating as miss");
                None
            },
        };

        let (movie, link, fresh) = match cached {
            Some(row) => {
                debug!(user_id, title = %row.movie_name, "cache hit");
                let link = row.link.clone();
                (MovieInfo::from_cache(&row), link, false)
            },
            None => {
                debug!(user_id, query = %query, "cache miss, fetching metadata");
                let movie = self.catalogue.by_keyword(query).await?;

                let search_title = movie.title_for(lang);
                let candidates = self.searcher.candidates(search_title, lang).await;
                let link = ranker::shortlist(&candidates, 1).into_iter().next();
                debug!(
                    title = %search_title,
                    candidates = candidates.len(),
                    link_found = link.is_some(),
                    "link discovery complete"
                );

                (movie, link, true)
            },
        };

        // Cache hits resolve to the cached key; fresh fetches to the
        // catalogue title in the display language.
        let canonical_title = if fresh {
            movie.title_for(lang).to_string()
        } else {
            movie.title_ru.clone()
        };

        // Best-effort writes: each record is independently meaningful, so a
        // failed sibling never rolls the others back or fails the run.
        if let Err(err) = self.store.record_query(user_id, query, &canonical_title).await {
            warn!(user_id, error = %err, "failed to record query history");
        }
        if let Err(err) = self.store.increment_usage(user_id, &canonical_title).await {
            warn!(user_id, error = %err, "failed to increment usage counter");
        }
        if link.is_some() || fresh {
            if let Err(err) = self.store.upsert_movie(&movie, link.as_deref()).await {
                warn!(title = %movie.title_ru, error = %err, "failed to upsert movie cache");
            }
        }

        Ok(Resolution { movie, link, canonical_title })
    }

    pub async fn resolve_random_by_genre(
        &self,
        user_id: i64,
        genre: Genre,
        lang: Lang,
    ) -> Result<Resolution, ResolveError> {
        let pick = self.catalogue.random_by_genre(genre).await?;
        debug!(genre = genre.name_ru(), title = %pick.title_ru, "random pick from top listing");
        self.resolve(user_id, &pick.title_ru, lang).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sea_orm::EntityTrait;

    use super::*;
    use crate::{entities::search_history, store::memory_store};

    struct FakeCatalogue {
        movie: Option<MovieInfo>,
        genre_fails: bool,
        keyword_calls: AtomicUsize,
        genre_calls: AtomicUsize,
    }

    impl FakeCatalogue {
        fn returning(movie: MovieInfo) -> Self {
            Self {
                movie: Some(movie),
                genre_fails: false,
                keyword_calls: AtomicUsize::new(0),
                genre_calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self {
                movie: None,
                genre_fails: false,
                keyword_calls: AtomicUsize::new(0),
                genre_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MovieCatalogue for FakeCatalogue {
        async fn by_keyword(&self, _query: &str) -> Result<MovieInfo, ResolveError> {
            self.keyword_calls.fetch_add(1, Ordering::SeqCst);
            self.movie.clone().ok_or(ResolveError::NotFound)
        }

        async fn random_by_genre(&self, _genre: Genre) -> Result<MovieInfo, ResolveError> {
            self.genre_calls.fetch_add(1, Ordering::SeqCst);
            if self.genre_fails {
                return Err(ResolveError::GenreScan("page 1: status 502".to_string()));
            }
            self.movie.clone().ok_or(ResolveError::NotFound)
        }
    }

    struct FakeSearcher {
        urls: Vec<String>,
        calls: AtomicUsize,
    }

    impl FakeSearcher {
        fn returning(urls: &[&str]) -> Self {
            Self {
                urls: urls.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LinkSearcher for FakeSearcher {
        async fn candidates(&self, _title: &str, _lang: Lang) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.clone()
        }
    }

    fn interstellar() -> MovieInfo {
        MovieInfo {
            kinopoisk_id: Some(258687),
            title_ru: "Интерстеллар".to_string(),
            title_en: "Interstellar".to_string(),
            year: Some(2014),
            length: Some("2:49".to_string()),
            description_ru: "Экипаж покидает Землю".to_string(),
            description_en: "A crew leaves Earth".to_string(),
            genres_ru: vec!["фантастика".to_string()],
            genres_en: vec!["sci-fi".to_string()],
            rating: Some(8.6),
            poster_url: Some("https://example.com/poster.jpg".to_string()),
        }
    }

    async fn pipeline(
        catalogue: Arc<FakeCatalogue>,
        searcher: Arc<FakeSearcher>,
    ) -> (Pipeline, Store) {
        let store = memory_store().await;
        (Pipeline::new(store.clone(), catalogue.clone(), searcher.clone()), store)
    }

    #[tokio::test]
    async fn fresh_resolution_ranks_links_and_fills_the_cache() {
        let catalogue = Arc::new(FakeCatalogue::returning(interstellar()));
        let searcher = Arc::new(FakeSearcher::returning(&[
            "https://inoriginal.example/x",
            "https://netflix.example/y",
        ]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        let res = pipeline.resolve(7, "Interstellar", Lang::Ru).await.unwrap();

        assert_eq!(res.link.as_deref(), Some("https://inoriginal.example/x"));
        assert_eq!(res.canonical_title, "Интерстеллар");
        assert_eq!(res.movie.year, Some(2014));

        let row = store.get_movie("Интерстеллар").await.unwrap().unwrap();
        assert_eq!(row.link.as_deref(), Some("https://inoriginal.example/x"));

        let history = store.history(7, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "Interstellar");
        assert_eq!(history[0].movie_name, "Интерстеллар");

        let stats = store.stats(7).await.unwrap();
        assert_eq!(stats[0].movie_name, "Интерстеллар");
        assert_eq!(stats[0].count, 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_metadata_and_scrape() {
        let catalogue = Arc::new(FakeCatalogue::returning(interstellar()));
        let searcher = Arc::new(FakeSearcher::returning(&["https://rutube.example/v"]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        store
            .upsert_movie(&interstellar(), Some("https://inoriginal.example/x"))
            .await
            .unwrap();

        let res = pipeline.resolve(7, "Интерстеллар", Lang::Ru).await.unwrap();

        assert_eq!(catalogue.keyword_calls.load(Ordering::SeqCst), 0);
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(res.link.as_deref(), Some("https://inoriginal.example/x"));
        assert_eq!(res.canonical_title, "Интерстеллар");

        // cache-hydrated records come back without id, length or poster
        assert!(res.movie.kinopoisk_id.is_none());
        assert!(res.movie.length.is_none());
        assert!(res.movie.poster_url.is_none());
        assert_eq!(res.movie.description_en, "A crew leaves Earth");
    }

    #[tokio::test]
    async fn repeated_resolutions_accumulate_usage() {
        let catalogue = Arc::new(FakeCatalogue::returning(interstellar()));
        let searcher = Arc::new(FakeSearcher::returning(&["https://inoriginal.example/x"]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        for _ in 0..3 {
            pipeline.resolve(7, "Интерстеллар", Lang::Ru).await.unwrap();
        }

        let stats = store.stats(7).await.unwrap();
        assert_eq!(stats[0].count, 3);
        // first run missed, the rest hit the cache
        assert_eq!(catalogue.keyword_calls.load(Ordering::SeqCst), 1);
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn metadata_failure_writes_nothing() {
        let catalogue = Arc::new(FakeCatalogue::empty());
        let searcher = Arc::new(FakeSearcher::returning(&["https://rutube.example/v"]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        let err = pipeline.resolve(7, "Несуществующий фильм", Lang::Ru).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));

        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);
        assert!(store.get_movie("Несуществующий фильм").await.unwrap().is_none());
        assert!(store.history(7, 10).await.unwrap().is_empty());
        assert!(store.stats(7).await.unwrap().is_empty());
        assert_eq!(
            search_history::Entity::find().all(store.db()).await.unwrap().len(),
            0
        );
    }

    #[tokio::test]
    async fn empty_shortlist_resolves_without_link() {
        let catalogue = Arc::new(FakeCatalogue::returning(interstellar()));
        let searcher = Arc::new(FakeSearcher::returning(&[
            "https://netflix.example/y",
            "https://kinopoisk.example/z",
        ]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        let res = pipeline.resolve(7, "Интерстеллар", Lang::Ru).await.unwrap();
        assert!(res.link.is_none());

        // fresh fetch is cached even without a link, and usage still counts
        let row = store.get_movie("Интерстеллар").await.unwrap().unwrap();
        assert!(row.link.is_none());
        assert_eq!(store.stats(7).await.unwrap()[0].count, 1);
    }

    #[tokio::test]
    async fn english_display_resolves_to_the_english_title() {
        let catalogue = Arc::new(FakeCatalogue::returning(interstellar()));
        let searcher = Arc::new(FakeSearcher::returning(&["https://inoriginal.example/x"]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        let res = pipeline.resolve(7, "Interstellar", Lang::En).await.unwrap();

        assert_eq!(res.canonical_title, "Interstellar");
        let stats = store.stats(7).await.unwrap();
        assert_eq!(stats[0].movie_name, "Interstellar");
        // the cache stays keyed by the Russian title
        assert!(store.get_movie("Интерстеллар").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn genre_scan_failure_produces_no_record() {
        let catalogue = Arc::new(FakeCatalogue {
            movie: Some(interstellar()),
            genre_fails: true,
            keyword_calls: AtomicUsize::new(0),
            genre_calls: AtomicUsize::new(0),
        });
        let searcher = Arc::new(FakeSearcher::returning(&["https://rutube.example/v"]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        let err = pipeline.resolve_random_by_genre(7, Genre::Horror, Lang::Ru).await.unwrap_err();
        assert!(matches!(err, ResolveError::GenreScan(_)));

        assert_eq!(catalogue.keyword_calls.load(Ordering::SeqCst), 0);
        assert_eq!(searcher.calls.load(Ordering::SeqCst), 0);
        assert!(store.history(7, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn random_pick_flows_through_the_regular_resolution() {
        let catalogue = Arc::new(FakeCatalogue::returning(interstellar()));
        let searcher = Arc::new(FakeSearcher::returning(&["https://inoriginal.example/x"]));
        let (pipeline, store) = pipeline(catalogue.clone(), searcher.clone()).await;

        let res =
            pipeline.resolve_random_by_genre(7, Genre::SciFi, Lang::Ru).await.unwrap();

        assert_eq!(catalogue.genre_calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalogue.keyword_calls.load(Ordering::SeqCst), 1);
        assert_eq!(res.canonical_title, "Интерстеллар");
        assert!(store.get_movie("Интерстеллар").await.unwrap().is_some());
    }
}
