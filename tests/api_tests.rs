use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use thrift_feed::api::{create_router, AppState};
use thrift_feed::models::{NewProductTag, TagCategory};
use thrift_feed::repository::InMemoryCatalog;

fn create_test_server(catalog: &InMemoryCatalog) -> TestServer {
    let state = AppState::from_repository(Arc::new(catalog.clone()));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn ids(body: &[Value]) -> Vec<String> {
    body.iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(&InMemoryCatalog::new());
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(&InMemoryCatalog::new());
    let request_id = Uuid::new_v4().to_string();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(&request_id).unwrap(),
        )
        .await;

    let echoed = response.headers().get("x-request-id").unwrap();
    assert_eq!(echoed.to_str().unwrap(), request_id);
}

#[tokio::test]
async fn test_feed_for_new_user_is_trending() {
    let catalog = InMemoryCatalog::new();
    let popular = catalog.add_product("Leather jacket", "Outerwear", "Loop", 40).await;
    let quiet = catalog.add_product("Linen shirt", "Tops", "Loop", 2).await;
    let server = create_test_server(&catalog);

    let response = server
        .get(&format!("/api/v1/feed/{}", Uuid::new_v4()))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(ids(&body), vec![popular.to_string(), quiet.to_string()]);
    assert!(body[0].get("recommendation_score").is_none());
    assert_eq!(body[0]["shop_name"], "Loop");
}

#[tokio::test]
async fn test_feed_scores_tag_matches() {
    let catalog = InMemoryCatalog::new();
    let user = Uuid::new_v4();
    let liked = catalog.add_product("Denim jacket", "Outerwear", "Loop", 5).await;
    let match_b = catalog.add_product("Vintage jeans", "Bottoms", "Loop", 8).await;
    let match_c = catalog.add_product("Vintage tee", "Tops", "Loop", 1).await;
    catalog
        .tag_product(
            liked,
            &[
                NewProductTag::new("Vintage", TagCategory::Style),
                NewProductTag::new("Denim", TagCategory::Material),
            ],
        )
        .await;
    for id in [match_b, match_c] {
        catalog
            .tag_product(id, &[NewProductTag::new("Vintage", TagCategory::Style)])
            .await;
    }
    catalog.like(user, liked).await;
    let server = create_test_server(&catalog);

    let response = server.get(&format!("/api/v1/feed/{}?limit=5", user)).await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(ids(&body), vec![match_b.to_string(), match_c.to_string()]);

    let score = &body[0]["recommendation_score"];
    assert!((score["score"].as_f64().unwrap() - 2.3).abs() < 1e-9);
    assert_eq!(score["matched_tags"], json!(["Vintage"]));
    assert_eq!(score["reason"], "Tag-based match");
}

#[tokio::test]
async fn test_feed_rejects_bad_limit() {
    let server = create_test_server(&InMemoryCatalog::new());

    let response = server
        .get(&format!("/api/v1/feed/{}?limit=0", Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn test_feed_rejects_malformed_user_id() {
    let server = create_test_server(&InMemoryCatalog::new());
    let response = server.get("/api/v1/feed/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trending_endpoint() {
    let catalog = InMemoryCatalog::new();
    for (name, likes) in [("A", 1), ("B", 3), ("C", 2)] {
        catalog.add_product(name, "Misc", "Loop", likes).await;
    }
    let server = create_test_server(&catalog);

    let response = server.get("/api/v1/products/trending?limit=2").await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    let likes: Vec<i64> = body.iter().map(|p| p["likes_count"].as_i64().unwrap()).collect();
    assert_eq!(likes, vec![3, 2]);
}

#[tokio::test]
async fn test_similar_products_for_untagged_product() {
    let catalog = InMemoryCatalog::new();
    let reference = catalog.add_product("Tote", "Bags", "Loop", 0).await;
    catalog.add_product("Clutch", "Bags", "Loop", 0).await;
    catalog.add_product("Backpack", "Bags", "Loop", 0).await;
    let server = create_test_server(&catalog);

    let response = server
        .get(&format!("/api/v1/products/{}/similar", reference))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 2);
    assert!(!ids(&body).contains(&reference.to_string()));
}

#[tokio::test]
async fn test_related_products_unknown_product_is_404() {
    let server = create_test_server(&InMemoryCatalog::new());

    let response = server
        .get(&format!("/api/v1/products/{}/related", Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_and_read_product_tags() {
    let catalog = InMemoryCatalog::new();
    let product = catalog.add_product("Wool coat", "Outerwear", "Loop", 0).await;
    let server = create_test_server(&catalog);

    let response = server
        .put(&format!("/api/v1/products/{}/tags", product))
        .json(&json!({
            "tags": [
                { "tag": "Wool", "category": "material" },
                { "tag": "Winter", "category": "season" }
            ]
        }))
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/v1/products/{}/tags", product))
        .await;
    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    let tags: Vec<&str> = body.iter().map(|t| t["tag"].as_str().unwrap()).collect();
    assert_eq!(tags, vec!["Wool", "Winter"]);
}

#[tokio::test]
async fn test_add_product_tags_keeps_existing() {
    let catalog = InMemoryCatalog::new();
    let product = catalog.add_product("Wool coat", "Outerwear", "Loop", 0).await;
    catalog
        .tag_product(product, &[NewProductTag::new("Wool", TagCategory::Material)])
        .await;
    let server = create_test_server(&catalog);

    let response = server
        .post(&format!("/api/v1/products/{}/tags", product))
        .json(&json!({
            "tags": [
                { "tag": "Wool", "category": "material" },
                { "tag": "Winter", "category": "season" }
            ]
        }))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    let tags: Vec<&str> = body.iter().map(|t| t["tag"].as_str().unwrap()).collect();
    assert_eq!(tags, vec!["Wool", "Winter"]);
}

#[tokio::test]
async fn test_add_product_tags_unknown_product_is_404() {
    let server = create_test_server(&InMemoryCatalog::new());

    let response = server
        .post(&format!("/api/v1/products/{}/tags", Uuid::new_v4()))
        .json(&json!({ "tags": [{ "tag": "Winter", "category": "season" }] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_tags_rejects_unknown_tag() {
    let catalog = InMemoryCatalog::new();
    let product = catalog.add_product("Wool coat", "Outerwear", "Loop", 0).await;
    let server = create_test_server(&catalog);

    let response = server
        .put(&format!("/api/v1/products/{}/tags", product))
        .json(&json!({ "tags": [{ "tag": "Sparkly", "category": "vibe" }] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_products_by_tags_requires_tags() {
    let server = create_test_server(&InMemoryCatalog::new());
    let response = server.get("/api/v1/products/by-tags?tags=,").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommended_for_user_uses_liked_categories() {
    let catalog = InMemoryCatalog::new();
    let user = Uuid::new_v4();
    let liked = catalog.add_product("Midi skirt", "Skirts", "Loop", 1).await;
    let pick = catalog.add_product("Pleated skirt", "Skirts", "Loop", 6).await;
    catalog.add_product("Parka", "Outerwear", "Loop", 60).await;
    catalog.like(user, liked).await;
    let server = create_test_server(&catalog);

    let response = server
        .get(&format!("/api/v1/users/{}/recommended", user))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(ids(&body), vec![pick.to_string()]);
}

#[tokio::test]
async fn test_tag_vocabulary() {
    let server = create_test_server(&InMemoryCatalog::new());

    let response = server.get("/api/v1/tags").await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 8);
    assert_eq!(body[0]["category"], "style");
    assert_eq!(body[0]["tags"][0], "Vintage");
}
