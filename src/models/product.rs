use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Display record for a product, joined with the name of the shop selling it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ProductCard {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub shop_name: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub stock: i32,
    /// Image URLs, first one is the cover
    pub images: Vec<String>,
    /// Popularity counter, incremented on each like
    pub likes_count: i32,
    pub created_at: DateTime<Utc>,
}

impl ProductCard {
    /// Orders cards by popularity: most liked first, newer first on ties
    pub fn cmp_trending(a: &ProductCard, b: &ProductCard) -> std::cmp::Ordering {
        b.likes_count
            .cmp(&a.likes_count)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(likes_count: i32, day: u32) -> ProductCard {
        ProductCard {
            id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            shop_name: "Second Spin".to_string(),
            name: "Wool coat".to_string(),
            price: 45.0,
            category: "Outerwear".to_string(),
            stock: 1,
            images: vec!["https://img/1.jpg".to_string()],
            likes_count,
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_cmp_trending_prefers_likes_then_recency() {
        let older_popular = card(10, 1);
        let newer_popular = card(10, 2);
        let unpopular = card(1, 3);

        let mut cards = vec![unpopular.clone(), older_popular.clone(), newer_popular.clone()];
        cards.sort_by(ProductCard::cmp_trending);

        assert_eq!(cards, vec![newer_popular, older_popular, unpopular]);
    }

    #[test]
    fn test_card_serializes_snake_case_fields() {
        let json = serde_json::to_value(card(3, 1)).unwrap();
        assert_eq!(json["shop_name"], "Second Spin");
        assert_eq!(json["likes_count"], 3);
        assert_eq!(json["images"][0], "https://img/1.jpg");
    }
}
