use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::PreferenceSource;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Why the personalized feed had nothing to rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSignal {
    /// No likes, cart entries or orders
    NoInteractions,
    /// The user's interaction products carry no tags
    UntaggedInteractions,
    /// No product carries any of the user's tags
    NoTagMatches,
    /// Every tag-matched candidate is something the user already has
    AllCandidatesExcluded,
}

impl std::fmt::Display for NoSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            NoSignal::NoInteractions => "user has no interactions",
            NoSignal::UntaggedInteractions => "interaction products have no tags",
            NoSignal::NoTagMatches => "no products match the user's tags",
            NoSignal::AllCandidatesExcluded => "all candidates were already interacted with",
        };
        write!(f, "{}", text)
    }
}

/// Failure categories of the personalization pipeline.
///
/// None of these reach HTTP callers: the feed falls back to trending products
/// instead. They exist so callers and tests can tell the cases apart.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("{source_name} source unavailable: {error}")]
    SourceUnavailable {
        source_name: PreferenceSource,
        error: AppError,
    },

    #[error("No personalization signal: {0}")]
    NoSignal(NoSignal),

    #[error("Unexpected failure: {0}")]
    Unexpected(#[from] AppError),
}

pub type FeedResult<T> = Result<T, FeedError>;
