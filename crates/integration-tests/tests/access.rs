//! Access control over HTTP.
//!
//! Requires a running API server; see the crate docs.

use reqwest::{Client, StatusCode};
use serde_json::Value;

fn base_url() -> String {
    std::env::var("SHOPFORGE_TEST_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_owner_routes_need_a_session() {
    let client = Client::new();
    for path in ["/api/v1/me", "/api/v1/shops"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");

        let body: Value = resp.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "Not logged in");
    }
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_admin_routes_need_a_session() {
    let resp = Client::new()
        .get(format!("{}/api/v1/admin/shops", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_unknown_storefront() {
    let resp = Client::new()
        .get(format!("{}/api/v1/shop/no-such-shop-here", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Shop not found");
}
