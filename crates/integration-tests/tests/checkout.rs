//! Storefront checkout against a running server and its database.

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use shopforge_integration_tests::TestContext;

fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("money is serialized as a string")
        .parse()
        .expect("valid decimal")
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_prices_from_catalog() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let (shop_id, slug) = ctx.seed_shop(owner, true).await;
    let a = ctx.seed_product(shop_id, "Zelený čaj", price(1000)).await;
    let b = ctx.seed_product(shop_id, "Hrnček", price(500)).await;
    ctx.seed_shipping(shop_id, "Kuriér", price(499)).await;

    let resp = ctx
        .client
        .post(ctx.url(&format!("/api/v1/shop/{slug}/orders")))
        .json(&json!({
            "items": [
                { "product_id": a, "quantity": 2 },
                { "product_id": b, "quantity": 1 }
            ],
            "shipping": { "first_name": "Jana", "city": "Bratislava" },
            "billing": { "email": "jana@example.sk" },
            "shipping_method": "Kuriér",
            "payment_method": "cod"
        }))
        .send()
        .await
        .expect("Failed to place order");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(decimal(&body["total"]), price(2999));
    assert!(body["order_number"].as_str().is_some_and(|n| n.starts_with("ORD-")));

    let items: Vec<(i32, Decimal)> = sqlx::query_as(
        "SELECT i.quantity, i.total FROM order_items i JOIN orders o ON o.id = i.order_id \
         WHERE o.shop_id = $1 ORDER BY i.total DESC",
    )
    .bind(shop_id)
    .fetch_all(&ctx.pool)
    .await
    .expect("Failed to read items");
    assert_eq!(items, vec![(2, price(2000)), (1, price(500))]);

    ctx.cleanup(owner).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_on_unpublished_shop_writes_nothing() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let (shop_id, slug) = ctx.seed_shop(owner, false).await;
    let a = ctx.seed_product(shop_id, "Zelený čaj", price(1000)).await;

    let resp = ctx
        .client
        .post(ctx.url(&format!("/api/v1/shop/{slug}/orders")))
        .json(&json!({ "items": [{ "product_id": a, "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to send checkout");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.order_count(shop_id).await, 0);

    ctx.cleanup(owner).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_rejects_stale_price() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let (shop_id, slug) = ctx.seed_shop(owner, true).await;
    let a = ctx.seed_product(shop_id, "Zelený čaj", price(1000)).await;

    let resp = ctx
        .client
        .post(ctx.url(&format!("/api/v1/shop/{slug}/orders")))
        .json(&json!({ "items": [{ "product_id": a, "quantity": 1, "unit_price": "9.00" }] }))
        .send()
        .await
        .expect("Failed to send checkout");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.order_count(shop_id).await, 0);

    ctx.cleanup(owner).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_rejects_foreign_product() {
    let ctx = TestContext::new().await;
    let owner = ctx.seed_user().await;
    let (shop_id, slug) = ctx.seed_shop(owner, true).await;
    let (other_shop, _) = ctx.seed_shop(owner, true).await;
    let foreign = ctx.seed_product(other_shop, "Cudzí", price(100)).await;

    let resp = ctx
        .client
        .post(ctx.url(&format!("/api/v1/shop/{slug}/orders")))
        .json(&json!({ "items": [{ "product_id": foreign, "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to send checkout");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.order_count(shop_id).await, 0);

    ctx.cleanup(owner).await;
}
