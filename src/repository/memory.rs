use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewProductTag, OrderRecord, ProductCard, ProductTag},
};

use super::CatalogRepository;

/// In-process catalog for tests and local demos
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<CatalogData>>,
}

#[derive(Default)]
struct CatalogData {
    products: HashMap<Uuid, ProductCard>,
    /// Insertion order, so unordered reads are still reproducible
    product_order: Vec<Uuid>,
    tags: Vec<ProductTag>,
    likes: Vec<(Uuid, Uuid)>,
    carts: Vec<(Uuid, Uuid)>,
    orders: Vec<(Uuid, OrderRecord)>,
}

impl CatalogData {
    fn cards_in_order(&self) -> impl Iterator<Item = &ProductCard> {
        self.product_order
            .iter()
            .filter_map(|id| self.products.get(id))
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product and returns its id
    pub async fn add_product(
        &self,
        name: &str,
        category: &str,
        shop_name: &str,
        likes_count: i32,
    ) -> Uuid {
        let card = ProductCard {
            id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            shop_name: shop_name.to_string(),
            name: name.to_string(),
            price: 20.0,
            category: category.to_string(),
            stock: 1,
            images: Vec::new(),
            likes_count,
            created_at: Utc::now(),
        };
        self.insert_product(card).await
    }

    /// Adds a fully specified product card
    pub async fn insert_product(&self, card: ProductCard) -> Uuid {
        let id = card.id;
        let mut inner = self.inner.write().await;
        if inner.products.insert(id, card).is_none() {
            inner.product_order.push(id);
        }
        id
    }

    pub async fn tag_product(&self, product_id: Uuid, tags: &[NewProductTag]) {
        let mut inner = self.inner.write().await;
        for tag in tags {
            let row = ProductTag {
                product_id,
                tag: tag.tag.clone(),
                category: tag.category,
            };
            if !inner.tags.contains(&row) {
                inner.tags.push(row);
            }
        }
    }

    pub async fn like(&self, user_id: Uuid, product_id: Uuid) {
        let mut inner = self.inner.write().await;
        if !inner.likes.contains(&(user_id, product_id)) {
            inner.likes.push((user_id, product_id));
        }
    }

    pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid) {
        let mut inner = self.inner.write().await;
        if !inner.carts.contains(&(user_id, product_id)) {
            inner.carts.push((user_id, product_id));
        }
    }

    /// Records an order whose line items reference `product_ids`
    pub async fn place_order(&self, user_id: Uuid, product_ids: &[Uuid]) {
        let items = product_ids
            .iter()
            .map(|id| serde_json::json!({ "id": id.to_string(), "quantity": 1 }))
            .collect();
        let order = OrderRecord {
            id: Uuid::new_v4(),
            items: serde_json::Value::Array(items),
        };
        self.inner.write().await.orders.push((user_id, order));
    }
}

fn take(limit: usize, cards: impl Iterator<Item = ProductCard>) -> Vec<ProductCard> {
    cards.take(limit).collect()
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn liked_product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .likes
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, product)| *product)
            .collect())
    }

    async fn cart_product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .carts
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, product)| *product)
            .collect())
    }

    async fn order_history(&self, user_id: Uuid) -> AppResult<Vec<OrderRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, order)| order.clone())
            .collect())
    }

    async fn tags_for_products(&self, product_ids: &[Uuid]) -> AppResult<Vec<ProductTag>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tags
            .iter()
            .filter(|t| product_ids.contains(&t.product_id))
            .cloned()
            .collect())
    }

    async fn tag_matches(&self, tags: &[String]) -> AppResult<Vec<ProductTag>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tags
            .iter()
            .filter(|t| tags.contains(&t.tag))
            .cloned()
            .collect())
    }

    async fn popularity(&self, product_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i32>> {
        let inner = self.inner.read().await;
        Ok(product_ids
            .iter()
            .filter_map(|id| inner.products.get(id).map(|p| (*id, p.likes_count)))
            .collect())
    }

    async fn product_cards(&self, product_ids: &[Uuid]) -> AppResult<Vec<ProductCard>> {
        let inner = self.inner.read().await;
        let wanted: HashSet<&Uuid> = product_ids.iter().collect();
        Ok(inner
            .cards_in_order()
            .filter(|card| wanted.contains(&card.id))
            .cloned()
            .collect())
    }

    async fn trending(&self, limit: usize) -> AppResult<Vec<ProductCard>> {
        let inner = self.inner.read().await;
        let mut cards: Vec<ProductCard> = inner.products.values().cloned().collect();
        cards.sort_by(ProductCard::cmp_trending);
        cards.truncate(limit);
        Ok(cards)
    }

    async fn products_excluding(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<ProductCard>> {
        let inner = self.inner.read().await;
        Ok(take(
            limit,
            inner
                .cards_in_order()
                .filter(|card| card.id != product_id)
                .cloned(),
        ))
    }

    async fn products_in_categories(
        &self,
        categories: &[String],
        exclude: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<ProductCard>> {
        let inner = self.inner.read().await;
        let mut cards: Vec<ProductCard> = inner
            .products
            .values()
            .filter(|card| categories.contains(&card.category) && !exclude.contains(&card.id))
            .cloned()
            .collect();
        cards.sort_by(ProductCard::cmp_trending);
        cards.truncate(limit);
        Ok(cards)
    }

    async fn replace_product_tags(
        &self,
        product_id: Uuid,
        tags: &[NewProductTag],
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product_id) {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }

        inner.tags.retain(|t| t.product_id != product_id);
        inner.tags.extend(tags.iter().map(|t| ProductTag {
            product_id,
            tag: t.tag.clone(),
            category: t.category,
        }));
        Ok(())
    }

    async fn add_product_tags(&self, product_id: Uuid, tags: &[NewProductTag]) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product_id) {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }

        for tag in tags {
            let present = inner
                .tags
                .iter()
                .any(|t| t.product_id == product_id && t.tag == tag.tag);
            if !present {
                inner.tags.push(ProductTag {
                    product_id,
                    tag: tag.tag.clone(),
                    category: tag.category,
                });
            }
        }
        Ok(())
    }
}
