use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{tag_vocabulary, NewProductTag, ProductCard, ProductTag, RecommendedProduct, TagGroup},
    services::tags,
};

use super::AppState;

const MAX_LIMIT: usize = 100;

const DEFAULT_FEED_LIMIT: usize = 12;
const DEFAULT_TRENDING_LIMIT: usize = 8;
const DEFAULT_SIMILAR_LIMIT: usize = 5;
const DEFAULT_RELATED_LIMIT: usize = 4;
const DEFAULT_RECOMMENDED_LIMIT: usize = 6;
const DEFAULT_BY_TAGS_LIMIT: usize = 20;

// Request types

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn resolve(&self, default: usize) -> AppResult<usize> {
        match self.limit {
            None => Ok(default),
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
            Some(limit) => Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ByTagsQuery {
    /// Comma-separated tag names
    pub tags: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<NewProductTag>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Personalized feed for a user; falls back to trending products
pub async fn personalized_feed(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<RecommendedProduct>>> {
    let limit = query.resolve(DEFAULT_FEED_LIMIT)?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit,
        "Processing feed request"
    );

    let products = state
        .recommendations
        .get_personalized_feed_recommendations(user_id, limit)
        .await;

    Ok(Json(products))
}

/// Category-based picks from the user's likes
pub async fn recommended_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<ProductCard>>> {
    let limit = query.resolve(DEFAULT_RECOMMENDED_LIMIT)?;
    Ok(Json(
        state.recommendations.recommended_by_likes(user_id, limit).await,
    ))
}

/// Most liked products
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<ProductCard>>> {
    let limit = query.resolve(DEFAULT_TRENDING_LIMIT)?;
    Ok(Json(state.recommendations.trending_fallback(limit).await))
}

/// Products sharing tags with the given product
pub async fn similar_products(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<ProductCard>>> {
    let limit = query.resolve(DEFAULT_SIMILAR_LIMIT)?;
    Ok(Json(
        state
            .recommendations
            .get_similar_products(product_id, limit)
            .await,
    ))
}

/// Products in the same category
pub async fn related_products(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<ProductCard>>> {
    let limit = query.resolve(DEFAULT_RELATED_LIMIT)?;
    let products = state
        .recommendations
        .related_products(product_id, limit)
        .await?;
    Ok(Json(products))
}

/// Products carrying the most of the requested tags
pub async fn products_by_tags(
    State(state): State<AppState>,
    Query(query): Query<ByTagsQuery>,
) -> AppResult<Json<Vec<ProductCard>>> {
    let limit = LimitQuery { limit: query.limit }.resolve(DEFAULT_BY_TAGS_LIMIT)?;
    let tag_names: Vec<String> = query
        .tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    if tag_names.is_empty() {
        return Err(AppError::InvalidInput("at least one tag is required".to_string()));
    }

    Ok(Json(
        state.recommendations.products_by_tags(&tag_names, limit).await,
    ))
}

/// Tags attached to a product
pub async fn get_product_tags(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductTag>>> {
    let tags = tags::product_tags(state.recommendations.repository(), product_id).await?;
    Ok(Json(tags))
}

/// Replaces a product's tags
pub async fn replace_product_tags(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<TagsRequest>,
) -> AppResult<Json<Vec<ProductTag>>> {
    tracing::info!(
        request_id = %request_id,
        product_id = %product_id,
        tag_count = request.tags.len(),
        "Replacing product tags"
    );

    let tags = state
        .recommendations
        .replace_product_tags(product_id, request.tags)
        .await?;
    Ok(Json(tags))
}

/// Adds tags to a product without removing existing ones
pub async fn add_product_tags(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<TagsRequest>,
) -> AppResult<Json<Vec<ProductTag>>> {
    tracing::info!(
        request_id = %request_id,
        product_id = %product_id,
        tag_count = request.tags.len(),
        "Adding product tags"
    );

    let tags = state
        .recommendations
        .add_product_tags(product_id, request.tags)
        .await?;
    Ok(Json(tags))
}

/// The fixed tag vocabulary, grouped by category
pub async fn list_tags() -> Json<Vec<TagGroup>> {
    Json(tag_vocabulary())
}
