pub mod movie_cache;
pub mod movie_stats;
pub mod search_history;
pub mod users;
