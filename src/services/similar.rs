use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::ProductCard,
    repository::CatalogRepository,
    services::tags::unique_tags,
};

/// Products sharing tags with `product_id`, for the product page.
///
/// Falls back to arbitrary other products when the reference product has no
/// tags or nothing shares them. Never fails: errors yield an empty list.
pub async fn get_similar_products(
    repo: &dyn CatalogRepository,
    cache: Option<&Cache>,
    ttl: u64,
    product_id: Uuid,
    limit: usize,
) -> Vec<ProductCard> {
    let result = match cache {
        Some(cache) => cached!(
            cache,
            CacheKey::SimilarProducts(product_id, limit),
            ttl,
            similar_products(repo, product_id, limit)
        ),
        None => similar_products(repo, product_id, limit).await,
    };

    match result {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(product_id = %product_id, error = %e, "Similar products lookup failed");
            Vec::new()
        }
    }
}

/// Ranks by shared tag count, then likes count, then id
pub async fn similar_products(
    repo: &dyn CatalogRepository,
    product_id: Uuid,
    limit: usize,
) -> AppResult<Vec<ProductCard>> {
    let reference_tags = unique_tags(&repo.tags_for_products(&[product_id]).await?);
    if reference_tags.is_empty() {
        tracing::debug!(product_id = %product_id, "Reference product has no tags");
        return repo.products_excluding(product_id, limit).await;
    }

    let mut shared: HashMap<Uuid, usize> = HashMap::new();
    for row in repo.tag_matches(&reference_tags).await? {
        if row.product_id != product_id {
            *shared.entry(row.product_id).or_default() += 1;
        }
    }

    if shared.is_empty() {
        tracing::debug!(product_id = %product_id, "No other product shares a tag");
        return repo.products_excluding(product_id, limit).await;
    }

    let candidate_ids: Vec<Uuid> = shared.keys().copied().collect();
    let popularity = repo.popularity(&candidate_ids).await?;

    let mut ranked: Vec<(Uuid, usize, i32)> = shared
        .into_iter()
        .map(|(id, count)| (id, count, popularity.get(&id).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(limit);

    let ids: Vec<Uuid> = ranked.iter().map(|(id, _, _)| *id).collect();
    let position: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut cards = repo.product_cards(&ids).await?;
    cards.sort_by_key(|card| position.get(&card.id).copied().unwrap_or(usize::MAX));

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{NewProductTag, TagCategory},
        repository::{InMemoryCatalog, MockCatalogRepository},
    };

    fn tags(names: &[(&str, TagCategory)]) -> Vec<NewProductTag> {
        names
            .iter()
            .map(|(tag, category)| NewProductTag::new(*tag, *category))
            .collect()
    }

    #[tokio::test]
    async fn test_untagged_reference_returns_other_products() {
        let catalog = InMemoryCatalog::new();
        let reference = catalog.add_product("Mystery box", "Misc", "Loop", 0).await;
        for name in ["A", "B", "C"] {
            catalog.add_product(name, "Misc", "Loop", 0).await;
        }

        let products = get_similar_products(&catalog, None, 60, reference, 2).await;

        assert_eq!(products.len(), 2);
        assert!(products.iter().all(|p| p.id != reference));
    }

    #[tokio::test]
    async fn test_ranks_by_shared_tags_then_likes() {
        let catalog = InMemoryCatalog::new();
        let reference = catalog.add_product("Jacket", "Outerwear", "Loop", 0).await;
        let two_tags = catalog.add_product("Vest", "Outerwear", "Loop", 0).await;
        let one_tag_popular = catalog.add_product("Jeans", "Bottoms", "Loop", 50).await;
        let one_tag = catalog.add_product("Shirt", "Tops", "Loop", 1).await;
        let unrelated = catalog.add_product("Sandals", "Shoes", "Loop", 99).await;

        catalog
            .tag_product(
                reference,
                &tags(&[("Denim", TagCategory::Material), ("Vintage", TagCategory::Style)]),
            )
            .await;
        catalog
            .tag_product(
                two_tags,
                &tags(&[("Denim", TagCategory::Material), ("Vintage", TagCategory::Style)]),
            )
            .await;
        catalog
            .tag_product(one_tag_popular, &tags(&[("Denim", TagCategory::Material)]))
            .await;
        catalog
            .tag_product(one_tag, &tags(&[("Vintage", TagCategory::Style)]))
            .await;
        catalog
            .tag_product(unrelated, &tags(&[("Summer", TagCategory::Season)]))
            .await;

        let ids: Vec<Uuid> = get_similar_products(&catalog, None, 60, reference, 5)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec![two_tags, one_tag_popular, one_tag]);
    }

    #[tokio::test]
    async fn test_no_shared_tags_falls_back() {
        let catalog = InMemoryCatalog::new();
        let reference = catalog.add_product("Scarf", "Accessories", "Loop", 0).await;
        let other = catalog.add_product("Gloves", "Accessories", "Loop", 0).await;
        catalog
            .tag_product(reference, &tags(&[("Silk", TagCategory::Material)]))
            .await;

        let products = get_similar_products(&catalog, None, 60, reference, 5).await;

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, other);
    }

    #[tokio::test]
    async fn test_store_error_yields_empty() {
        let mut repo = MockCatalogRepository::new();
        repo.expect_tags_for_products()
            .returning(|_| Err(AppError::Internal("boom".to_string())));

        let products = get_similar_products(&repo, None, 60, Uuid::new_v4(), 5).await;
        assert!(products.is_empty());
    }
}
