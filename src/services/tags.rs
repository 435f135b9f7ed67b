use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewProductTag, ProductCard, ProductTag},
    repository::CatalogRepository,
};

/// Distinct tags attached to any of `product_ids`, in first-seen order
pub async fn extract_tags(
    repo: &dyn CatalogRepository,
    product_ids: &[Uuid],
) -> AppResult<Vec<String>> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = repo.tags_for_products(product_ids).await?;
    Ok(unique_tags(&rows))
}

/// Dedupes tag strings by value, keeping the first occurrence
pub fn unique_tags(rows: &[ProductTag]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.tag.as_str()))
        .map(|row| row.tag.clone())
        .collect()
}

/// Tags currently attached to a product
pub async fn product_tags(
    repo: &dyn CatalogRepository,
    product_id: Uuid,
) -> AppResult<Vec<ProductTag>> {
    repo.tags_for_products(&[product_id]).await
}

/// Checks seller-chosen tags against the vocabulary and drops repeats
pub fn validate_tags(tags: Vec<NewProductTag>) -> AppResult<Vec<NewProductTag>> {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(tags.len());

    for tag in tags {
        if !tag.category.allows(&tag.tag) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not a {} tag",
                tag.tag, tag.category
            )));
        }
        if seen.insert(tag.tag.clone()) {
            valid.push(tag);
        }
    }

    Ok(valid)
}

/// Replaces a product's tags after validating them
pub async fn update_product_tags(
    repo: &dyn CatalogRepository,
    product_id: Uuid,
    tags: Vec<NewProductTag>,
) -> AppResult<Vec<ProductTag>> {
    let tags = validate_tags(tags)?;
    repo.replace_product_tags(product_id, &tags).await?;

    Ok(tags
        .into_iter()
        .map(|t| ProductTag {
            product_id,
            tag: t.tag,
            category: t.category,
        })
        .collect())
}

/// Attaches validated tags to a product and returns its full tag list
pub async fn add_product_tags(
    repo: &dyn CatalogRepository,
    product_id: Uuid,
    tags: Vec<NewProductTag>,
) -> AppResult<Vec<ProductTag>> {
    let tags = validate_tags(tags)?;
    repo.add_product_tags(product_id, &tags).await?;
    product_tags(repo, product_id).await
}

/// Products carrying the most of `tags`, best match first
pub async fn products_by_tags(
    repo: &dyn CatalogRepository,
    tags: &[String],
    limit: usize,
) -> AppResult<Vec<ProductCard>> {
    let rows = repo.tag_matches(tags).await?;

    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for row in &rows {
        *counts.entry(row.product_id).or_default() += 1;
    }

    let mut ranked: Vec<(Uuid, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);

    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
    let mut cards = repo.product_cards(&ids).await?;
    let rank: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    cards.sort_by_key(|card| rank.get(&card.id).copied().unwrap_or(usize::MAX));

    Ok(cards)
}
