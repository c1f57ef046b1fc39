mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::entities::CustomerRole;

#[tokio::test]
async fn address_list_populates_then_hits_the_cache() {
    let app = TestApp::new().await;
    let (customer, token) = app.seed_customer("cached@example.com", CustomerRole::Customer).await;
    app.seed_address(customer.id).await;

    let first = app
        .request(Method::GET, "/api/account/addresses", None, Some(&token))
        .await;
    assert_status(&first, StatusCode::OK);
    let first_body = body_json(first).await;
    assert_eq!(first_body["data"]["from_cache"], false);
    assert_eq!(first_body["data"]["addresses"].as_array().unwrap().len(), 1);

    let second = app
        .request(Method::GET, "/api/account/addresses", None, Some(&token))
        .await;
    let second_body = body_json(second).await;
    assert_eq!(second_body["data"]["from_cache"], true);
    // Identical payload apart from the cache flag
    assert_eq!(first_body["data"]["addresses"], second_body["data"]["addresses"]);
}

#[tokio::test]
async fn address_mutation_invalidates_only_that_customers_cache() {
    let app = TestApp::new().await;
    let (customer, token) = app.seed_customer("cached@example.com", CustomerRole::Customer).await;
    let address = app.seed_address(customer.id).await;

    // Prime the cache
    let primed = app
        .request(Method::GET, "/api/account/addresses", None, Some(&token))
        .await;
    assert_eq!(body_json(primed).await["data"]["from_cache"], false);
    let hit = app
        .request(Method::GET, "/api/account/addresses", None, Some(&token))
        .await;
    assert_eq!(body_json(hit).await["data"]["from_cache"], true);

    // Patch drops the key; next read recomputes and sees the new value
    let patched = app
        .request(
            Method::PATCH,
            &format!("/api/account/addresses/{}", address.id),
            Some(json!({"city": "New City"})),
            Some(&token),
        )
        .await;
    assert_status(&patched, StatusCode::OK);

    let after = app
        .request(Method::GET, "/api/account/addresses", None, Some(&token))
        .await;
    let after_body = body_json(after).await;
    assert_eq!(after_body["data"]["from_cache"], false);
    assert_eq!(after_body["data"]["addresses"][0]["city"], "New City");
}

#[tokio::test]
async fn search_results_are_cached_per_query() {
    let app = TestApp::new().await;
    app.seed_product("HOODIE-1", dec!(49.99), 5).await;
    app.seed_product("HOODIE-2", dec!(59.99), 5).await;
    app.seed_product("SOCKS-1", dec!(4.99), 50).await;

    let first = app
        .request(Method::GET, "/api/products/search?q=hoodie", None, None)
        .await;
    assert_status(&first, StatusCode::OK);
    let first_body = body_json(first).await;
    assert_eq!(first_body["data"]["from_cache"], false);
    assert_eq!(first_body["data"]["total"], 2);

    let second = app
        .request(Method::GET, "/api/products/search?q=hoodie", None, None)
        .await;
    let second_body = body_json(second).await;
    assert_eq!(second_body["data"]["from_cache"], true);
    assert_eq!(second_body["data"]["products"], first_body["data"]["products"]);

    // A different query is its own key
    let other = app
        .request(Method::GET, "/api/products/search?q=socks", None, None)
        .await;
    let other_body = body_json(other).await;
    assert_eq!(other_body["data"]["from_cache"], false);
    assert_eq!(other_body["data"]["total"], 1);
}

#[tokio::test]
async fn featured_listing_is_cached() {
    let app = TestApp::new().await;
    app.seed_product_with("FEAT-1", dec!(10.00), 3, true).await;
    app.seed_product("PLAIN-1", dec!(10.00), 3).await;

    let first = app
        .request(Method::GET, "/api/products/featured", None, None)
        .await;
    let first_body = body_json(first).await;
    assert_eq!(first_body["data"]["from_cache"], false);
    assert_eq!(first_body["data"]["products"].as_array().unwrap().len(), 1);

    let second = app
        .request(Method::GET, "/api/products/featured", None, None)
        .await;
    assert_eq!(body_json(second).await["data"]["from_cache"], true);
}

#[tokio::test]
async fn search_cache_entries_expire_after_the_ttl() {
    let app = TestApp::with_config(|cfg| {
        // Sub-second TTLs are impossible through the config (it is
        // seconds-granular), so use the smallest window and a real sleep
        cfg.cache_search_ttl_secs = 1;
    })
    .await;
    app.seed_product("TTL-1", dec!(1.00), 1).await;

    let first = app
        .request(Method::GET, "/api/products/search?q=ttl", None, None)
        .await;
    assert_eq!(body_json(first).await["data"]["from_cache"], false);

    let warm = app
        .request(Method::GET, "/api/products/search?q=ttl", None, None)
        .await;
    assert_eq!(body_json(warm).await["data"]["from_cache"], true);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let expired = app
        .request(Method::GET, "/api/products/search?q=ttl", None, None)
        .await;
    assert_eq!(body_json(expired).await["data"]["from_cache"], false);
}
