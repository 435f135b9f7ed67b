use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::ProductCard,
    repository::CatalogRepository,
};

/// Top `limit` products by likes count, served from cache when one is configured
pub async fn trending_products(
    repo: &dyn CatalogRepository,
    cache: Option<&Cache>,
    ttl: u64,
    limit: usize,
) -> AppResult<Vec<ProductCard>> {
    match cache {
        Some(cache) => cached!(cache, CacheKey::Trending(limit), ttl, repo.trending(limit)),
        None => repo.trending(limit).await,
    }
}

/// Trending products for when personalization has nothing to work with.
///
/// Never fails: a store error yields an empty list.
pub async fn trending_fallback(
    repo: &dyn CatalogRepository,
    cache: Option<&Cache>,
    ttl: u64,
    limit: usize,
) -> Vec<ProductCard> {
    match trending_products(repo, cache, ttl, limit).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(error = %e, limit, "Trending fallback failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        repository::{InMemoryCatalog, MockCatalogRepository},
    };

    #[tokio::test]
    async fn test_orders_by_likes_and_truncates() {
        let catalog = InMemoryCatalog::new();
        for (name, likes) in [("Tee", 2), ("Coat", 30), ("Hat", 0), ("Bag", 11)] {
            catalog.add_product(name, "Misc", "Loop", likes).await;
        }

        let products = trending_fallback(&catalog, None, 60, 3).await;
        let likes: Vec<i32> = products.iter().map(|p| p.likes_count).collect();

        assert_eq!(likes, vec![30, 11, 2]);
    }

    #[tokio::test]
    async fn test_store_error_yields_empty() {
        let mut repo = MockCatalogRepository::new();
        repo.expect_trending()
            .returning(|_| Err(AppError::Internal("pool timed out".to_string())));

        assert!(trending_fallback(&repo, None, 60, 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_trending_products_surfaces_error() {
        let mut repo = MockCatalogRepository::new();
        repo.expect_trending()
            .returning(|_| Err(AppError::Internal("pool timed out".to_string())));

        let result = trending_products(&repo, None, 60, 5).await;
        tokio_test::assert_err!(result);
    }
}
