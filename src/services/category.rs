use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    db::Cache,
    error::{AppError, AppResult},
    models::ProductCard,
    repository::CatalogRepository,
    services::trending::trending_products,
};

/// Popular products from the categories a user has liked, excluding the liked ones.
///
/// Users without likes get trending products. Errors yield an empty list.
pub async fn recommended_by_likes(
    repo: &dyn CatalogRepository,
    cache: Option<&Cache>,
    trending_ttl: u64,
    user_id: Uuid,
    limit: usize,
) -> Vec<ProductCard> {
    match try_recommended_by_likes(repo, cache, trending_ttl, user_id, limit).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "Category recommendations failed");
            Vec::new()
        }
    }
}

async fn try_recommended_by_likes(
    repo: &dyn CatalogRepository,
    cache: Option<&Cache>,
    trending_ttl: u64,
    user_id: Uuid,
    limit: usize,
) -> AppResult<Vec<ProductCard>> {
    let liked = repo.liked_product_ids(user_id).await?;
    if liked.is_empty() {
        return trending_products(repo, cache, trending_ttl, limit).await;
    }

    let mut seen = HashSet::new();
    let categories: Vec<String> = repo
        .product_cards(&liked)
        .await?
        .into_iter()
        .map(|card| card.category)
        .filter(|category| seen.insert(category.clone()))
        .collect();

    if categories.is_empty() {
        return trending_products(repo, cache, trending_ttl, limit).await;
    }

    repo.products_in_categories(&categories, &liked, limit).await
}

/// Other products in the same category as `product_id`
pub async fn related_products(
    repo: &dyn CatalogRepository,
    product_id: Uuid,
    limit: usize,
) -> AppResult<Vec<ProductCard>> {
    let product = repo
        .product_cards(&[product_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("product {}", product_id)))?;

    repo.products_in_categories(&[product.category], &[product_id], limit)
        .await
}
