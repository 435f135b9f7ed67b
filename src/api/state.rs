use std::sync::Arc;

use crate::repository::CatalogRepository;
use crate::services::RecommendationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(recommendations: RecommendationService) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
        }
    }

    /// State over a catalog with default weights and no cache
    pub fn from_repository(repo: Arc<dyn CatalogRepository>) -> Self {
        Self::new(RecommendationService::new(repo))
    }
}
