//! Owner updates and tenant isolation against a live database.
//!
//! Requires a running API server; see the crate docs.

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

use shopforge_core::UserRole;
use shopforge_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_shop_update_ignores_unlisted_columns() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let intruder = ctx.seed_user().await;
    let (shop_id, slug) = ctx.seed_shop(owner, false).await;
    let cookie = ctx.seed_session(owner, UserRole::User).await;

    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/v1/shops/{shop_id}")))
        .header(COOKIE, &cookie)
        .json(&json!({
            "name": "Premenovaná čajovňa",
            "user_id": intruder,
            "domain_verified": true,
            "ssl_enabled": true,
            "created_at": "2001-01-01T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let (name, user_id, stored_slug, domain_verified, ssl_enabled, advanced): (
        String,
        Uuid,
        String,
        bool,
        bool,
        bool,
    ) = sqlx::query_as(
        "SELECT name, user_id, slug, domain_verified, ssl_enabled, updated_at > created_at \
         FROM shops WHERE id = $1",
    )
    .bind(shop_id)
    .fetch_one(&ctx.pool)
    .await
    .expect("Failed to read shop");

    assert_eq!(name, "Premenovaná čajovňa");
    assert_eq!(user_id, owner);
    assert_eq!(stored_slug, slug);
    assert!(!domain_verified);
    assert!(!ssl_enabled);
    assert!(advanced, "updated_at did not move");

    ctx.cleanup(owner).await;
    ctx.cleanup(intruder).await;
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_product_update_cannot_move_product_between_shops() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let (shop_id, _) = ctx.seed_shop(owner, true).await;
    let (other_shop, _) = ctx.seed_shop(owner, true).await;
    let product = ctx
        .seed_product(shop_id, "Sencha", Decimal::new(1290, 2))
        .await;
    let cookie = ctx.seed_session(owner, UserRole::User).await;

    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/v1/shops/{shop_id}/products/{product}")))
        .header(COOKIE, &cookie)
        .json(&json!({ "price": "14.50", "shop_id": other_shop, "id": Uuid::new_v4() }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["price"], "14.50");

    let (stored_shop, price, advanced): (Uuid, Decimal, bool) = sqlx::query_as(
        "SELECT shop_id, price, updated_at > created_at FROM products WHERE id = $1",
    )
    .bind(product)
    .fetch_one(&ctx.pool)
    .await
    .expect("Failed to read product");

    assert_eq!(stored_shop, shop_id);
    assert_eq!(price, Decimal::new(1450, 2));
    assert!(advanced, "updated_at did not move");

    ctx.cleanup(owner).await;
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_other_users_shop_is_not_found() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let stranger = ctx.seed_user().await;
    let (shop_id, _) = ctx.seed_shop(owner, true).await;
    let product = ctx
        .seed_product(shop_id, "Sencha", Decimal::new(1290, 2))
        .await;
    let cookie = ctx.seed_session(stranger, UserRole::User).await;

    let requests = [
        ctx.client.get(ctx.url(&format!("/api/v1/shops/{shop_id}"))),
        ctx.client
            .put(ctx.url(&format!("/api/v1/shops/{shop_id}")))
            .json(&json!({ "name": "Ukradnutý obchod" })),
        ctx.client.get(ctx.url(&format!("/api/v1/shops/{shop_id}/products"))),
        ctx.client
            .put(ctx.url(&format!("/api/v1/shops/{shop_id}/products/{product}")))
            .json(&json!({ "price": "0.01" })),
        ctx.client.get(ctx.url(&format!("/api/v1/shops/{shop_id}/orders"))),
        ctx.client.get(ctx.url(&format!("/api/v1/shops/{shop_id}/settings"))),
        ctx.client.delete(ctx.url(&format!("/api/v1/shops/{shop_id}"))),
    ];

    for request in requests {
        let resp = request
            .header(COOKIE, &cookie)
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "Shop not found");
    }

    assert!(ctx.shop_exists(shop_id).await);
    let (name, price): (String, Decimal) = sqlx::query_as(
        "SELECT s.name, p.price FROM shops s JOIN products p ON p.shop_id = s.id WHERE p.id = $1",
    )
    .bind(product)
    .fetch_one(&ctx.pool)
    .await
    .expect("Failed to read shop");
    assert_eq!(name, "Test Shop");
    assert_eq!(price, Decimal::new(1290, 2));

    ctx.cleanup(owner).await;
    ctx.cleanup(stranger).await;
}
