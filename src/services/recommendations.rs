use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::{
    db::{Cache, CacheKey},
    error::{AppResult, FeedError, FeedResult, NoSignal},
    models::{NewProductTag, ProductCard, ProductTag, RecommendedProduct, ScoringWeights},
    repository::CatalogRepository,
    services::{category, preferences, scoring, similar, tags, trending},
};

/// Candidates scored per requested feed item, leaving room for exclusions
const CANDIDATE_MULTIPLIER: usize = 3;

/// Entry point for every recommendation surface of the storefront.
///
/// Holds the catalog, the optional cache and the scoring weights; built
/// once at startup and shared across requests.
#[derive(Clone)]
pub struct RecommendationService {
    repo: Arc<dyn CatalogRepository>,
    cache: Option<Cache>,
    weights: ScoringWeights,
    trending_ttl: u64,
    similar_ttl: u64,
}

impl RecommendationService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self {
            repo,
            cache: None,
            weights: ScoringWeights::default(),
            trending_ttl: 300,
            similar_ttl: 900,
        }
    }

    pub fn with_cache(mut self, cache: Cache, trending_ttl: u64, similar_ttl: u64) -> Self {
        self.cache = Some(cache);
        self.trending_ttl = trending_ttl;
        self.similar_ttl = similar_ttl;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn repository(&self) -> &dyn CatalogRepository {
        self.repo.as_ref()
    }

    /// Personalized feed for a user, best match first.
    ///
    /// Never fails. When there is no personalization signal, or anything goes
    /// wrong, the user gets trending products instead (without scores).
    pub async fn get_personalized_feed_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Vec<RecommendedProduct> {
        let start = Instant::now();

        match self.build_personalized_feed(user_id, limit).await {
            Ok(products) => {
                tracing::info!(
                    user_id = %user_id,
                    count = products.len(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "Personalized feed built"
                );
                products
            }
            Err(FeedError::NoSignal(reason)) => {
                tracing::info!(user_id = %user_id, reason = %reason, "Serving trending feed");
                self.trending_feed(limit).await
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Personalized feed failed, serving trending");
                self.trending_feed(limit).await
            }
        }
    }

    /// The personalization pipeline without the fallback, so callers can see
    /// why it produced nothing.
    pub async fn build_personalized_feed(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> FeedResult<Vec<RecommendedProduct>> {
        let repo = self.repository();

        // 1. Interaction history
        let fetch = preferences::fetch_user_preferences(repo, user_id).await;
        let prefs = fetch.preferences;
        if prefs.is_empty() {
            return Err(FeedError::NoSignal(NoSignal::NoInteractions));
        }

        // 2. Tags of everything the user interacted with
        let interacted = prefs.interaction_ids();
        let interacted_ids: Vec<Uuid> = interacted.iter().copied().collect();
        let user_tags = tags::extract_tags(repo, &interacted_ids).await?;
        if user_tags.is_empty() {
            return Err(FeedError::NoSignal(NoSignal::UntaggedInteractions));
        }

        // 3. Score candidates
        let candidates = scoring::score_products_by_tags(
            repo,
            &user_tags,
            &prefs,
            &self.weights,
            limit.saturating_mul(CANDIDATE_MULTIPLIER),
        )
        .await?;
        if candidates.is_empty() {
            return Err(FeedError::NoSignal(NoSignal::NoTagMatches));
        }

        // 4-5. Drop what the user already has, keep the best `limit`
        let top: Vec<_> = candidates
            .into_iter()
            .filter(|c| !interacted.contains(&c.product_id))
            .take(limit)
            .collect();
        if top.is_empty() {
            return Err(FeedError::NoSignal(NoSignal::AllCandidatesExcluded));
        }

        // 6. Display data
        let ids: Vec<Uuid> = top.iter().map(|s| s.product_id).collect();
        let cards = repo.product_cards(&ids).await?;

        let mut scores: HashMap<Uuid, _> = top.into_iter().map(|s| (s.product_id, s)).collect();
        let mut products: Vec<RecommendedProduct> = cards
            .into_iter()
            .filter_map(|product| {
                let score = scores.remove(&product.id)?;
                Some(RecommendedProduct {
                    product,
                    recommendation_score: Some(score.into()),
                })
            })
            .collect();

        // 7. Join order is arbitrary
        products.sort_by(|a, b| {
            b.score()
                .total_cmp(&a.score())
                .then_with(|| a.product.id.cmp(&b.product.id))
        });

        Ok(products)
    }

    async fn trending_feed(&self, limit: usize) -> Vec<RecommendedProduct> {
        self.trending_fallback(limit)
            .await
            .into_iter()
            .map(RecommendedProduct::unscored)
            .collect()
    }

    /// Top products by likes; empty on failure
    pub async fn trending_fallback(&self, limit: usize) -> Vec<ProductCard> {
        trending::trending_fallback(self.repository(), self.cache.as_ref(), self.trending_ttl, limit)
            .await
    }

    /// Tag-overlap neighbours of a product
    pub async fn get_similar_products(&self, product_id: Uuid, limit: usize) -> Vec<ProductCard> {
        similar::get_similar_products(
            self.repository(),
            self.cache.as_ref(),
            self.similar_ttl,
            product_id,
            limit,
        )
        .await
    }

    /// Popular products from the categories the user liked
    pub async fn recommended_by_likes(&self, user_id: Uuid, limit: usize) -> Vec<ProductCard> {
        category::recommended_by_likes(
            self.repository(),
            self.cache.as_ref(),
            self.trending_ttl,
            user_id,
            limit,
        )
        .await
    }

    /// Other products in the same category
    pub async fn related_products(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<ProductCard>> {
        category::related_products(self.repository(), product_id, limit).await
    }

    /// Products carrying the most of `tag_names`; empty on failure
    pub async fn products_by_tags(&self, tag_names: &[String], limit: usize) -> Vec<ProductCard> {
        match tags::products_by_tags(self.repository(), tag_names, limit).await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(tags = ?tag_names, error = %e, "Tag search failed");
                Vec::new()
            }
        }
    }

    /// Replaces a product's tags
    pub async fn replace_product_tags(
        &self,
        product_id: Uuid,
        new_tags: Vec<NewProductTag>,
    ) -> AppResult<Vec<ProductTag>> {
        let updated = tags::update_product_tags(self.repository(), product_id, new_tags).await?;
        self.invalidate_similar();
        Ok(updated)
    }

    /// Adds tags to a product, keeping its current ones
    pub async fn add_product_tags(
        &self,
        product_id: Uuid,
        new_tags: Vec<NewProductTag>,
    ) -> AppResult<Vec<ProductTag>> {
        let updated = tags::add_product_tags(self.repository(), product_id, new_tags).await?;
        self.invalidate_similar();
        Ok(updated)
    }

    // A tag edit can change the neighbours of any product that shared the
    // old or new tags, so every similar list goes.
    fn invalidate_similar(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_in_background(CacheKey::SIMILAR_PRODUCTS_PATTERN);
        }
    }
}
