mod interaction;
mod product;
mod recommendation;
mod tag;

pub use interaction::{purchased_product_ids, OrderRecord, PreferenceSource, UserPreferences};
pub use product::ProductCard;
pub use recommendation::{
    RecommendationScore, RecommendedProduct, ScoreSummary, ScoringWeights, REASON_CART,
    REASON_LIKED, REASON_PURCHASED, REASON_TAG_MATCH,
};
pub use tag::{tag_vocabulary, NewProductTag, ProductTag, TagCategory, TagGroup};
