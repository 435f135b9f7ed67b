use axum::{
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        // Outermost first: the request id must exist before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Personalized feed
        .route("/feed/:user_id", get(handlers::personalized_feed))
        .route("/users/:user_id/recommended", get(handlers::recommended_for_user))
        // Product pages
        .route("/products/trending", get(handlers::trending))
        .route("/products/by-tags", get(handlers::products_by_tags))
        .route("/products/:product_id/similar", get(handlers::similar_products))
        .route("/products/:product_id/related", get(handlers::related_products))
        .route(
            "/products/:product_id/tags",
            get(handlers::get_product_tags)
                .put(handlers::replace_product_tags)
                .post(handlers::add_product_tags),
        )
        // Tag vocabulary
        .route("/tags", get(handlers::list_tags))
}
