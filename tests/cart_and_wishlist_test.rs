mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::entities::CustomerRole;

#[tokio::test]
async fn cart_add_list_and_remove() {
    let app = TestApp::new().await;
    let (customer, token) = app.seed_customer("cart@example.com", CustomerRole::Customer).await;
    let _ = customer;
    let shirt = app.seed_product("SHIRT-1", dec!(19.99), 10).await;
    let mug = app.seed_product("MUG-1", dec!(5.50), 10).await;

    let added = app
        .request(
            Method::POST,
            "/api/cart",
            Some(json!({"product_id": shirt.id, "quantity": 2})),
            Some(&token),
        )
        .await;
    assert_status(&added, StatusCode::OK);

    // Adding the same product again increments the row
    let again = app
        .request(
            Method::POST,
            "/api/cart",
            Some(json!({"product_id": shirt.id, "quantity": 1})),
            Some(&token),
        )
        .await;
    let body = body_json(again).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(body["data"]["subtotal"], "59.97");

    app.request(
        Method::POST,
        "/api/cart",
        Some(json!({"product_id": mug.id, "quantity": 1})),
        Some(&token),
    )
    .await;

    // Remove one product
    let removed = app
        .request(
            Method::DELETE,
            "/api/cart",
            Some(json!({"product_id": shirt.id})),
            Some(&token),
        )
        .await;
    let body = body_json(removed).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    // No product filter clears the cart
    let cleared = app
        .request(Method::DELETE, "/api/cart", Some(json!({})), Some(&token))
        .await;
    let body = body_json(cleared).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["subtotal"], "0");
}

#[tokio::test]
async fn cart_rejects_unknown_products_and_zero_quantities() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer("cart@example.com", CustomerRole::Customer).await;
    let shirt = app.seed_product("SHIRT-1", dec!(19.99), 10).await;

    let missing = app
        .request(
            Method::POST,
            "/api/cart",
            Some(json!({"product_id": uuid::Uuid::new_v4(), "quantity": 1})),
            Some(&token),
        )
        .await;
    assert_status(&missing, StatusCode::NOT_FOUND);

    let zero = app
        .request(
            Method::POST,
            "/api/cart",
            Some(json!({"product_id": shirt.id, "quantity": 0})),
            Some(&token),
        )
        .await;
    assert_status(&zero, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wishlist_add_is_idempotent() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer("wish@example.com", CustomerRole::Customer).await;
    let shirt = app.seed_product("SHIRT-1", dec!(19.99), 10).await;

    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/account/wishlist",
                Some(json!({"product_id": shirt.id})),
                Some(&token),
            )
            .await;
        assert_status(&response, StatusCode::OK);
    }

    let listed = app
        .request(Method::GET, "/api/account/wishlist", None, Some(&token))
        .await;
    let body = body_json(listed).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["sku"], "SHIRT-1");

    let removed = app
        .request(
            Method::DELETE,
            "/api/account/wishlist",
            Some(json!({"product_id": shirt.id})),
            Some(&token),
        )
        .await;
    let body = body_json(removed).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn wishlists_are_scoped_per_customer() {
    let app = TestApp::new().await;
    let (_, first_token) = app.seed_customer("one@example.com", CustomerRole::Customer).await;
    let (_, second_token) = app.seed_customer("two@example.com", CustomerRole::Customer).await;
    let shirt = app.seed_product("SHIRT-1", dec!(19.99), 10).await;

    app.request(
        Method::POST,
        "/api/account/wishlist",
        Some(json!({"product_id": shirt.id})),
        Some(&first_token),
    )
    .await;

    let other = app
        .request(Method::GET, "/api/account/wishlist", None, Some(&second_token))
        .await;
    assert!(body_json(other).await["data"].as_array().unwrap().is_empty());
}
