use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Display};
use uuid::Uuid;

/// The interaction tables that feed personalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceSource {
    Likes,
    Cart,
    Orders,
}

impl Display for PreferenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceSource::Likes => write!(f, "likes"),
            PreferenceSource::Cart => write!(f, "cart"),
            PreferenceSource::Orders => write!(f, "orders"),
        }
    }
}

/// A past order. `items` is the line-item array exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub items: serde_json::Value,
}

impl OrderRecord {
    /// Product ids referenced by this order's line items.
    ///
    /// Items without a parseable `id` are skipped; a non-array `items` yields nothing.
    pub fn product_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.items
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("id")?.as_str()?.parse().ok())
    }
}

/// Flattens an order history into distinct purchased product ids, in first-seen order
pub fn purchased_product_ids(orders: &[OrderRecord]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    orders
        .iter()
        .flat_map(|order| order.product_ids())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Everything a user has liked, put in their cart, or bought
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPreferences {
    pub liked_product_ids: Vec<Uuid>,
    pub cart_product_ids: Vec<Uuid>,
    pub purchased_product_ids: Vec<Uuid>,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.liked_product_ids.is_empty()
            && self.cart_product_ids.is_empty()
            && self.purchased_product_ids.is_empty()
    }

    /// liked ∪ cart ∪ purchased
    pub fn interaction_ids(&self) -> HashSet<Uuid> {
        self.liked_product_ids
            .iter()
            .chain(&self.cart_product_ids)
            .chain(&self.purchased_product_ids)
            .copied()
            .collect()
    }
}
