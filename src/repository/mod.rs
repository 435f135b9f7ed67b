//! Catalog data access
//!
//! Everything the recommender reads (interactions, tags, product cards) goes
//! through [`CatalogRepository`], so services can be driven by Postgres in
//! production and by fixture data in tests.

use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewProductTag, OrderRecord, ProductCard, ProductTag},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryCatalog;
pub use postgres::PgCatalogRepository;

/// Capability set consumed by the recommendation services
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Products the user has liked
    async fn liked_product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Products currently in the user's cart
    async fn cart_product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// The user's orders, with their raw line items
    async fn order_history(&self, user_id: Uuid) -> AppResult<Vec<OrderRecord>>;

    /// Tag rows attached to any of the given products
    async fn tags_for_products(&self, product_ids: &[Uuid]) -> AppResult<Vec<ProductTag>>;

    /// Every (product, tag) row whose tag is one of `tags`
    async fn tag_matches(&self, tags: &[String]) -> AppResult<Vec<ProductTag>>;

    /// Likes count per product; products that do not exist are absent
    async fn popularity(&self, product_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i32>>;

    /// Display records for the given products, in no particular order
    async fn product_cards(&self, product_ids: &[Uuid]) -> AppResult<Vec<ProductCard>>;

    /// Top products by likes count
    async fn trending(&self, limit: usize) -> AppResult<Vec<ProductCard>>;

    /// Any products other than `product_id`
    async fn products_excluding(&self, product_id: Uuid, limit: usize)
        -> AppResult<Vec<ProductCard>>;

    /// Products in any of `categories` not listed in `exclude`, most liked first
    async fn products_in_categories(
        &self,
        categories: &[String],
        exclude: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<ProductCard>>;

    /// Replaces all tags of a product
    async fn replace_product_tags(&self, product_id: Uuid, tags: &[NewProductTag])
        -> AppResult<()>;

    /// Attaches tags to a product, keeping the ones it already has.
    /// Tags already on the product are skipped.
    async fn add_product_tags(&self, product_id: Uuid, tags: &[NewProductTag]) -> AppResult<()>;
}
