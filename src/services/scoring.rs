//! Tag-match scoring for the personalized feed
//!
//! A candidate is any product sharing at least one tag with the user's
//! interaction history. Its score is built in three steps:
//!
//! 1. `base_score + tag_match × (distinct matching tags)`
//! 2. interaction multipliers (liked, then cart, then purchased)
//! 3. `+ popularity × likes_count`
//!
//! Candidates are ranked by score, highest first, ties by product id.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        ProductTag, RecommendationScore, ScoringWeights, UserPreferences, REASON_CART,
        REASON_LIKED, REASON_PURCHASED, REASON_TAG_MATCH,
    },
    repository::CatalogRepository,
};

/// Fetches tag matches and popularity, then scores the candidates
pub async fn score_products_by_tags(
    repo: &dyn CatalogRepository,
    tags: &[String],
    preferences: &UserPreferences,
    weights: &ScoringWeights,
    limit: usize,
) -> AppResult<Vec<RecommendationScore>> {
    let matches = repo.tag_matches(tags).await?;
    if matches.is_empty() {
        return Ok(Vec::new());
    }

    let candidate_ids: Vec<Uuid> = matches
        .iter()
        .map(|m| m.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let popularity = repo.popularity(&candidate_ids).await?;

    let scores = score_candidates(&matches, preferences, &popularity, weights, limit);

    tracing::debug!(
        tag_count = tags.len(),
        match_rows = matches.len(),
        candidates = candidate_ids.len(),
        returned = scores.len(),
        "Scored tag-match candidates"
    );

    Ok(scores)
}

/// Scores candidates from already-fetched tag matches and popularity counts
pub fn score_candidates(
    matches: &[ProductTag],
    preferences: &UserPreferences,
    popularity: &HashMap<Uuid, i32>,
    weights: &ScoringWeights,
    limit: usize,
) -> Vec<RecommendationScore> {
    let mut candidates: HashMap<Uuid, RecommendationScore> = HashMap::new();

    for m in matches {
        let candidate = candidates
            .entry(m.product_id)
            .or_insert_with(|| RecommendationScore {
                product_id: m.product_id,
                score: weights.base_score,
                matched_tags: Vec::new(),
                reason: REASON_TAG_MATCH.to_string(),
            });

        // The same (product, tag) pair counts once
        if !candidate.matched_tags.contains(&m.tag) {
            candidate.score += weights.tag_match;
            candidate.matched_tags.push(m.tag.clone());
        }
    }

    let liked: HashSet<&Uuid> = preferences.liked_product_ids.iter().collect();
    let cart: HashSet<&Uuid> = preferences.cart_product_ids.iter().collect();
    let purchased: HashSet<&Uuid> = preferences.purchased_product_ids.iter().collect();

    for candidate in candidates.values_mut() {
        // These reads like liked > cart > purchased tiers, but the boosts are
        // applied one after another: a product in several lists gets every
        // multiplier, and the reason of the last list that matched. Ranking
        // depends on this, so keep it until product decides otherwise.
        let id = candidate.product_id;
        if liked.contains(&id) {
            candidate.score *= weights.liked;
            candidate.reason = REASON_LIKED.to_string();
        }
        if cart.contains(&id) {
            candidate.score *= weights.cart_item;
            candidate.reason = REASON_CART.to_string();
        }
        if purchased.contains(&id) {
            candidate.score *= weights.purchased;
            candidate.reason = REASON_PURCHASED.to_string();
        }

        let likes = popularity.get(&id).copied().unwrap_or(0);
        candidate.score += f64::from(likes) * weights.popularity;
    }

    let mut ranked: Vec<RecommendationScore> = candidates.into_values().collect();
    ranked.sort_by(cmp_by_score);
    ranked.truncate(limit);
    ranked
}

/// Highest score first; product id breaks ties so output is reproducible
pub fn cmp_by_score(a: &RecommendationScore, b: &RecommendationScore) -> std::cmp::Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.product_id.cmp(&b.product_id))
}
