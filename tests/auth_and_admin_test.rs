mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, body_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::entities::CustomerRole;

#[tokio::test]
async fn register_login_and_use_the_session_cookie() {
    let app = TestApp::new().await;

    let registered = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({
                "email": "new@example.com",
                "name": "New Customer",
                "password": "correct-horse-battery"
            })),
            None,
        )
        .await;
    assert_status(&registered, StatusCode::CREATED);

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({
                "email": "new@example.com",
                "password": "correct-horse-battery"
            })),
            None,
        )
        .await;
    assert_status(&login, StatusCode::OK);

    let set_cookie = login
        .headers()
        .get("set-cookie")
        .expect("login sets the session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));

    let token = set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("token=")
        .to_string();

    // The cookie works on a protected route
    let cart = app.request(Method::GET, "/api/cart", None, Some(&token)).await;
    assert_status(&cart, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.request(
        Method::POST,
        "/api/auth/register",
        Some(json!({
            "email": "someone@example.com",
            "name": "Someone",
            "password": "correct-horse-battery"
        })),
        None,
    )
    .await;

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({
                "email": "someone@example.com",
                "password": "not-the-password"
            })),
            None,
        )
        .await;
    assert_status(&login, StatusCode::UNAUTHORIZED);

    let body = body_json(login).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    let payload = json!({
        "email": "dup@example.com",
        "name": "Dup",
        "password": "correct-horse-battery"
    });

    let first = app
        .request(Method::POST, "/api/auth/register", Some(payload.clone()), None)
        .await;
    assert_status(&first, StatusCode::CREATED);

    let second = app
        .request(Method::POST, "/api/auth/register", Some(payload), None)
        .await;
    assert_status(&second, StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_token_is_unauthorized_with_json_envelope() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/cart", None, None).await;
    assert_status(&response, StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn admin_routes_reject_regular_customers() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer("plain@example.com", CustomerRole::Customer).await;

    let response = app
        .request(Method::GET, "/api/admin/orders", None, Some(&token))
        .await;
    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_list_and_filter_orders() {
    let app = TestApp::new().await;
    let (admin, admin_token) = app.seed_customer("admin@example.com", CustomerRole::Admin).await;
    let (customer, token) = app.seed_customer("buyer@example.com", CustomerRole::Customer).await;
    let address = app.seed_address(customer.id).await;
    let product = app.seed_product("ADMIN-1", dec!(10.00), 10).await;
    let _ = admin;

    let created = app
        .request(
            Method::POST,
            "/api/orders",
            Some(json!({
                "items": [{"product_id": product.id, "quantity": 1, "price": "10.00"}],
                "address_id": address.id,
                "payment_method": "razorpay"
            })),
            Some(&token),
        )
        .await;
    assert_status(&created, StatusCode::CREATED);

    let listed = app
        .request(Method::GET, "/api/admin/orders?status=pending", None, Some(&admin_token))
        .await;
    assert_status(&listed, StatusCode::OK);
    let body = body_json(listed).await;
    assert_eq!(body["data"]["total"], 1);

    let none = app
        .request(Method::GET, "/api/admin/orders?status=delivered", None, Some(&admin_token))
        .await;
    assert_eq!(body_json(none).await["data"]["total"], 0);

    let bad = app
        .request(Method::GET, "/api/admin/orders?status=bogus", None, Some(&admin_token))
        .await;
    assert_status(&bad, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customer_export_is_a_csv_attachment() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_customer("admin@example.com", CustomerRole::Admin).await;
    app.seed_customer("first@example.com", CustomerRole::Customer).await;
    app.seed_customer("second@example.com", CustomerRole::Customer).await;

    let response = app
        .request(
            Method::POST,
            "/api/admin/customers/export",
            None,
            Some(&admin_token),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"customers.csv\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,email,name,role,active,created_at"
    );
    assert!(csv.contains("first@example.com"));
    assert!(csv.contains("second@example.com"));
}

#[tokio::test]
async fn dashboard_reports_counts_and_revenue() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_customer("admin@example.com", CustomerRole::Admin).await;

    let response = app
        .request(Method::GET, "/api/admin/dashboard", None, Some(&admin_token))
        .await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_orders"], 0);
    assert_eq!(body["data"]["total_customers"], 1);
    assert_eq!(body["data"]["revenue"], "0");
}
