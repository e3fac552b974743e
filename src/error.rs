use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Terminal failures of a resolution run. A missing watch link is not one of
/// these: the run still completes and returns a record.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The catalogue had no match for the query, or answered non-success.
    #[error("no catalogue match for the query")]
    NotFound,

    /// The catalogue request itself failed (transport or decode).
    #[error("catalogue request failed")]
    Catalogue(#[from] reqwest::Error),

    /// A page failed during the top-listing genre scan. Unlike the link
    /// search, a partial scan would bias the random pick, so any page
    /// failure aborts the whole operation.
    #[error("top listing scan failed: {0}")]
    GenreScan(String),
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

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
