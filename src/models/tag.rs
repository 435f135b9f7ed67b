use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

/// Group a tag belongs to. Sellers pick tags from a fixed list per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Style,
    Material,
    Season,
    Size,
    Type,
    Color,
    Condition,
    Vibe,
}

impl TagCategory {
    pub const ALL: [TagCategory; 8] = [
        TagCategory::Style,
        TagCategory::Material,
        TagCategory::Season,
        TagCategory::Size,
        TagCategory::Type,
        TagCategory::Color,
        TagCategory::Condition,
        TagCategory::Vibe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Style => "style",
            TagCategory::Material => "material",
            TagCategory::Season => "season",
            TagCategory::Size => "size",
            TagCategory::Type => "type",
            TagCategory::Color => "color",
            TagCategory::Condition => "condition",
            TagCategory::Vibe => "vibe",
        }
    }

    /// Tags a seller may choose from in this category
    pub fn vocabulary(&self) -> &'static [&'static str] {
        match self {
            TagCategory::Style => &[
                "Vintage", "Streetwear", "Formal", "Casual", "Bohemian", "Minimalist", "Y2K",
                "Grunge", "Preppy", "Retro",
            ],
            TagCategory::Material => &[
                "Cotton", "Silk", "Wool", "Linen", "Denim", "Leather", "Polyester", "Velvet",
                "Corduroy", "Suede",
            ],
            TagCategory::Season => &["Summer", "Winter", "Spring", "Fall", "All-Season"],
            TagCategory::Size => &["XS", "S", "M", "L", "XL", "XXL", "One-Size"],
            TagCategory::Type => &[
                "Shirt", "Pants", "Dress", "Jacket", "Skirt", "Sweater", "T-Shirt", "Shorts",
                "Coat", "Blazer", "Jeans", "Hoodie",
            ],
            TagCategory::Color => &[
                "Black", "White", "Red", "Blue", "Green", "Yellow", "Purple", "Pink", "Brown",
                "Gray", "Multicolor",
            ],
            TagCategory::Condition => &["Like-New", "Excellent", "Good", "Fair", "Well-Loved"],
            TagCategory::Vibe => &[
                "Trendy", "Classic", "Edgy", "Comfortable", "Luxury", "Eco-Friendly", "Unique",
                "Statement",
            ],
        }
    }

    pub fn allows(&self, tag: &str) -> bool {
        self.vocabulary().contains(&tag)
    }
}

impl Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TagCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown tag category '{}'", s))
    }
}

/// A tag attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductTag {
    pub product_id: Uuid,
    pub tag: String,
    pub category: TagCategory,
}

/// Tag chosen by a seller, before it is attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewProductTag {
    pub tag: String,
    pub category: TagCategory,
}

impl NewProductTag {
    pub fn new(tag: impl Into<String>, category: TagCategory) -> Self {
        Self {
            tag: tag.into(),
            category,
        }
    }
}

/// One category of the tag vocabulary, as served to clients
#[derive(Debug, Clone, Serialize)]
pub struct TagGroup {
    pub category: TagCategory,
    pub tags: &'static [&'static str],
}

/// The full tag vocabulary in display order
pub fn tag_vocabulary() -> Vec<TagGroup> {
    TagCategory::ALL
        .into_iter()
        .map(|category| TagGroup {
            category,
            tags: category.vocabulary(),
        })
        .collect()
}
