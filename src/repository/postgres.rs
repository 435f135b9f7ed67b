use sqlx::{types::Json, FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{NewProductTag, OrderRecord, ProductCard, ProductTag, TagCategory},
};

use super::CatalogRepository;

/// Columns of a product card, joined with the owning shop
const CARD_COLUMNS: &str = r#"
    p.id, p.shop_id, s.shop_name, p.name, p.price::float8 AS price, p.category,
    p.stock, p.images, p.likes_count, p.created_at
"#;

#[derive(FromRow)]
struct ProductTagRow {
    product_id: Uuid,
    tag: String,
    category: String,
}

impl TryFrom<ProductTagRow> for ProductTag {
    type Error = AppError;

    fn try_from(row: ProductTagRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<TagCategory>().map_err(AppError::Internal)?;
        Ok(ProductTag {
            product_id: row.product_id,
            tag: row.tag,
            category,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    items: Json<serde_json::Value>,
}

/// Postgres-backed catalog
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn tag_rows(rows: Vec<ProductTagRow>) -> AppResult<Vec<ProductTag>> {
        rows.into_iter().map(ProductTag::try_from).collect()
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn liked_product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT product_id FROM likes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn cart_product_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT product_id FROM carts WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn order_history(&self, user_id: Uuid) -> AppResult<Vec<OrderRecord>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, items FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderRecord {
                id: row.id,
                items: row.items.0,
            })
            .collect())
    }

    async fn tags_for_products(&self, product_ids: &[Uuid]) -> AppResult<Vec<ProductTag>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductTagRow>(
            r#"
            SELECT product_id, tag, category
            FROM product_tags
            WHERE product_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Self::tag_rows(rows)
    }

    async fn tag_matches(&self, tags: &[String]) -> AppResult<Vec<ProductTag>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductTagRow>(
            r#"
            SELECT product_id, tag, category
            FROM product_tags
            WHERE tag = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(tags)
        .fetch_all(&self.pool)
        .await?;

        Self::tag_rows(rows)
    }

    async fn popularity(&self, product_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i32>> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT id, likes_count FROM products WHERE id = ANY($1)",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn product_cards(&self, product_ids: &[Uuid]) -> AppResult<Vec<ProductCard>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM products p JOIN shops s ON s.id = p.shop_id WHERE p.id = ANY($1)",
            CARD_COLUMNS
        );
        let cards = sqlx::query_as::<_, ProductCard>(&sql)
            .bind(product_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(cards)
    }

    async fn trending(&self, limit: usize) -> AppResult<Vec<ProductCard>> {
        let sql = format!(
            r#"
            SELECT {} FROM products p JOIN shops s ON s.id = p.shop_id
            ORDER BY p.likes_count DESC, p.created_at DESC, p.id
            LIMIT $1
            "#,
            CARD_COLUMNS
        );
        let cards = sqlx::query_as::<_, ProductCard>(&sql)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(cards)
    }

    async fn products_excluding(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<ProductCard>> {
        let sql = format!(
            r#"
            SELECT {} FROM products p JOIN shops s ON s.id = p.shop_id
            WHERE p.id <> $1
            LIMIT $2
            "#,
            CARD_COLUMNS
        );
        let cards = sqlx::query_as::<_, ProductCard>(&sql)
            .bind(product_id)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(cards)
    }

    async fn products_in_categories(
        &self,
        categories: &[String],
        exclude: &[Uuid],
        limit: usize,
    ) -> AppResult<Vec<ProductCard>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {} FROM products p JOIN shops s ON s.id = p.shop_id
            WHERE p.category = ANY($1) AND NOT (p.id = ANY($2))
            ORDER BY p.likes_count DESC, p.created_at DESC, p.id
            LIMIT $3
            "#,
            CARD_COLUMNS
        );
        let cards = sqlx::query_as::<_, ProductCard>(&sql)
            .bind(categories)
            .bind(exclude)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(cards)
    }

    async fn replace_product_tags(
        &self,
        product_id: Uuid,
        tags: &[NewProductTag],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }

        sqlx::query("DELETE FROM product_tags WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        for tag in tags {
            sqlx::query("INSERT INTO product_tags (product_id, tag, category) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(&tag.tag)
                .bind(tag.category.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            tag_count = tags.len(),
            "Replaced product tags"
        );

        Ok(())
    }

    async fn add_product_tags(&self, product_id: Uuid, tags: &[NewProductTag]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }

        let mut inserted = 0u64;
        for tag in tags {
            let result = sqlx::query(
                r#"
                INSERT INTO product_tags (product_id, tag, category)
                VALUES ($1, $2, $3)
                ON CONFLICT (product_id, tag) DO NOTHING
                "#,
            )
            .bind(product_id)
            .bind(&tag.tag)
            .bind(tag.category.as_str())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            requested = tags.len(),
            inserted,
            "Added product tags"
        );

        Ok(())
    }
}
