mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{assert_status, body_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use storefront_api::entities::{order, CustomerRole, OrderStatus};
use uuid::Uuid;

async fn seed_numbered_order(app: &TestApp, customer_id: Uuid, number: i32) -> order::Model {
    let address = app.seed_address(customer_id).await;
    let now = Utc::now();
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(number),
        customer_id: Set(customer_id),
        address_id: Set(address.id),
        status: Set(OrderStatus::Shipped),
        total_amount: Set(dec!(75.00)),
        currency: Set("INR".to_string()),
        payment_method: Set("razorpay".to_string()),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed order")
}

#[tokio::test]
async fn five_digit_message_answers_from_the_order_book() {
    let app = TestApp::new().await;
    let (customer, token) = app.seed_customer("chat@example.com", CustomerRole::Customer).await;
    seed_numbered_order(&app, customer.id, 54321).await;

    let response = app
        .request(
            Method::POST,
            "/api/chatbot",
            Some(json!({"message": "54321"})),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["source"], "orders");
    let reply = body["data"]["reply"].as_str().unwrap();
    assert!(reply.contains("54321"));
    assert!(reply.contains("SHIPPED"));
}

#[tokio::test]
async fn unknown_order_number_is_answered_gracefully() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer("chat@example.com", CustomerRole::Customer).await;

    let response = app
        .request(
            Method::POST,
            "/api/chatbot",
            Some(json!({"message": "11111"})),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["source"], "orders");
    assert!(body["data"]["reply"].as_str().unwrap().contains("couldn't find"));
}

#[tokio::test]
async fn someone_elses_order_number_is_not_visible() {
    let app = TestApp::new().await;
    let (owner, _) = app.seed_customer("owner@example.com", CustomerRole::Customer).await;
    let (_, other_token) = app.seed_customer("other@example.com", CustomerRole::Customer).await;
    seed_numbered_order(&app, owner.id, 54321).await;

    let response = app
        .request(
            Method::POST,
            "/api/chatbot",
            Some(json!({"message": "54321"})),
            Some(&other_token),
        )
        .await;

    let body = body_json(response).await;
    assert!(body["data"]["reply"].as_str().unwrap().contains("couldn't find"));
}

#[tokio::test]
async fn free_text_goes_to_the_assistant() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": "You can return items within 30 days."}]}}
            ]
        })))
        .mount(&server)
        .await;

    let server_uri = server.uri();
    let app = TestApp::with_config(move |cfg| {
        cfg.assistant_api_url = server_uri;
        cfg.assistant_api_key = Some("test-key".to_string());
    })
    .await;
    let (_, token) = app.seed_customer("chat@example.com", CustomerRole::Customer).await;

    let response = app
        .request(
            Method::POST,
            "/api/chatbot",
            Some(json!({"message": "what is your return policy?"})),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["source"], "assistant");
    assert_eq!(
        body["data"]["reply"],
        "You can return items within 30 days."
    );
}

#[tokio::test]
async fn assistant_failure_maps_to_bad_gateway() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
        .expect(1) // no retry
        .mount(&server)
        .await;

    let server_uri = server.uri();
    let app = TestApp::with_config(move |cfg| {
        cfg.assistant_api_url = server_uri;
        cfg.assistant_api_key = Some("test-key".to_string());
    })
    .await;
    let (_, token) = app.seed_customer("chat@example.com", CustomerRole::Customer).await;

    let response = app
        .request(
            Method::POST,
            "/api/chatbot",
            Some(json!({"message": "hello"})),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::BAD_GATEWAY);
}
