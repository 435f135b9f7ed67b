use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProductCard;

pub const REASON_TAG_MATCH: &str = "Tag-based match";
pub const REASON_LIKED: &str = "Similar to liked items";
pub const REASON_CART: &str = "Similar to cart items";
pub const REASON_PURCHASED: &str = "Similar to purchased items";

/// Relevance of one candidate product for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationScore {
    pub product_id: Uuid,
    pub score: f64,
    pub matched_tags: Vec<String>,
    /// Human-readable explanation shown next to the product
    pub reason: String,
}

/// Score details attached to a product in the feed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: f64,
    pub matched_tags: Vec<String>,
    pub reason: String,
}

impl From<RecommendationScore> for ScoreSummary {
    fn from(score: RecommendationScore) -> Self {
        Self {
            score: score.score,
            matched_tags: score.matched_tags,
            reason: score.reason,
        }
    }
}

/// A product in the personalized feed.
///
/// Trending fallback items carry no `recommendation_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    #[serde(flatten)]
    pub product: ProductCard,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_score: Option<ScoreSummary>,
}

impl RecommendedProduct {
    pub fn unscored(product: ProductCard) -> Self {
        Self {
            product,
            recommendation_score: None,
        }
    }

    pub fn score(&self) -> f64 {
        self.recommendation_score
            .as_ref()
            .map(|s| s.score)
            .unwrap_or_default()
    }
}

/// Multipliers and bonuses used by the tag-match scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub liked: f64,
    pub cart_item: f64,
    pub purchased: f64,
    pub tag_match: f64,
    pub base_score: f64,
    pub popularity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            liked: 3.0,
            cart_item: 2.5,
            purchased: 2.0,
            tag_match: 1.0,
            base_score: 0.5,
            popularity: 0.1,
        }
    }
}
