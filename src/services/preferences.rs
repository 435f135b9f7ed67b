use uuid::Uuid;

use crate::{
    error::{AppResult, FeedError},
    models::{purchased_product_ids, PreferenceSource, UserPreferences},
    repository::CatalogRepository,
};

/// Result of reading a user's interaction history
#[derive(Debug, Default)]
pub struct PreferenceFetch {
    pub preferences: UserPreferences,
    /// Sources that failed and were treated as empty
    pub degraded: Vec<FeedError>,
}

impl PreferenceFetch {
    pub fn degraded_sources(&self) -> Vec<PreferenceSource> {
        self.degraded
            .iter()
            .filter_map(|e| match e {
                FeedError::SourceUnavailable { source_name, .. } => Some(*source_name),
                _ => None,
            })
            .collect()
    }
}

/// Reads liked, cart and purchased product ids for a user.
///
/// The three reads run concurrently. A failing source is logged and treated
/// as empty; it never fails the whole fetch.
pub async fn fetch_user_preferences(
    repo: &dyn CatalogRepository,
    user_id: Uuid,
) -> PreferenceFetch {
    let (liked, cart, orders) = tokio::join!(
        repo.liked_product_ids(user_id),
        repo.cart_product_ids(user_id),
        repo.order_history(user_id),
    );

    let mut degraded = Vec::new();
    let purchased = orders.map(|orders| purchased_product_ids(&orders));

    let preferences = UserPreferences {
        liked_product_ids: or_empty(liked, PreferenceSource::Likes, user_id, &mut degraded),
        cart_product_ids: or_empty(cart, PreferenceSource::Cart, user_id, &mut degraded),
        purchased_product_ids: or_empty(
            purchased,
            PreferenceSource::Orders,
            user_id,
            &mut degraded,
        ),
    };

    tracing::debug!(
        user_id = %user_id,
        liked = preferences.liked_product_ids.len(),
        cart = preferences.cart_product_ids.len(),
        purchased = preferences.purchased_product_ids.len(),
        degraded = degraded.len(),
        "Fetched user preferences"
    );

    PreferenceFetch {
        preferences,
        degraded,
    }
}

fn or_empty(
    result: AppResult<Vec<Uuid>>,
    source: PreferenceSource,
    user_id: Uuid,
    degraded: &mut Vec<FeedError>,
) -> Vec<Uuid> {
    match result {
        Ok(ids) => ids,
        Err(error) => {
            tracing::warn!(
                user_id = %user_id,
                source = %source,
                error = %error,
                "Preference source unavailable, treating as empty"
            );
            degraded.push(FeedError::SourceUnavailable {
                source_name: source,
                error,
            });
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::OrderRecord,
        repository::{InMemoryCatalog, MockCatalogRepository},
    };
    use serde_json::json;

    #[tokio::test]
    async fn test_user_without_rows_gets_empty_lists() {
        let catalog = InMemoryCatalog::new();
        let fetch = fetch_user_preferences(&catalog, Uuid::new_v4()).await;

        assert!(fetch.preferences.is_empty());
        assert!(fetch.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_reads_all_three_sources() {
        let catalog = InMemoryCatalog::new();
        let user = Uuid::new_v4();
        let liked = catalog.add_product("Cardigan", "Knitwear", "Loop", 0).await;
        let carted = catalog.add_product("Loafers", "Shoes", "Loop", 0).await;
        let bought = catalog.add_product("Belt", "Accessories", "Loop", 0).await;
        catalog.like(user, liked).await;
        catalog.add_to_cart(user, carted).await;
        catalog.place_order(user, &[bought, bought]).await;

        let prefs = fetch_user_preferences(&catalog, user).await.preferences;

        assert_eq!(prefs.liked_product_ids, vec![liked]);
        assert_eq!(prefs.cart_product_ids, vec![carted]);
        assert_eq!(prefs.purchased_product_ids, vec![bought]);
    }

    #[tokio::test]
    async fn test_failed_source_degrades_to_empty() {
        let liked = Uuid::new_v4();
        let bought = Uuid::new_v4();

        let mut repo = MockCatalogRepository::new();
        repo.expect_liked_product_ids()
            .returning(move |_| Ok(vec![liked]));
        repo.expect_cart_product_ids()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));
        repo.expect_order_history().returning(move |_| {
            Ok(vec![OrderRecord {
                id: Uuid::new_v4(),
                items: json!([{ "id": bought.to_string() }]),
            }])
        });

        let fetch = fetch_user_preferences(&repo, Uuid::new_v4()).await;

        assert_eq!(fetch.preferences.liked_product_ids, vec![liked]);
        assert!(fetch.preferences.cart_product_ids.is_empty());
        assert_eq!(fetch.preferences.purchased_product_ids, vec![bought]);
        assert_eq!(fetch.degraded_sources(), vec![PreferenceSource::Cart]);
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_not_an_error() {
        let mut repo = MockCatalogRepository::new();
        repo.expect_liked_product_ids()
            .returning(|_| Err(AppError::Internal("down".to_string())));
        repo.expect_cart_product_ids()
            .returning(|_| Err(AppError::Internal("down".to_string())));
        repo.expect_order_history()
            .returning(|_| Err(AppError::Internal("down".to_string())));

        let fetch = fetch_user_preferences(&repo, Uuid::new_v4()).await;

        assert!(fetch.preferences.is_empty());
        assert_eq!(
            fetch.degraded_sources(),
            vec![
                PreferenceSource::Likes,
                PreferenceSource::Cart,
                PreferenceSource::Orders
            ]
        );
    }
}
