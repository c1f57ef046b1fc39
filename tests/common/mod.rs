// Each integration test binary compiles this module and uses a
// different slice of it
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::{AuthConfig, AuthService},
    cache::{AppCache, InMemoryCache},
    config::AppConfig,
    db,
    entities::{cart_item, customer, customer_address, product, CustomerRole},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "integration_test_secret_0123456789_abcdefghijklmnopqrstuvwxyz_ABCDEFGH";

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application, letting the caller tweak the config
    /// (e.g. to point the gateway at a mock server).
    pub async fn with_config<F: FnOnce(&mut AppConfig)>(mutate: F) -> Self {
        let tmp = TempDir::new().expect("temp dir for test database");
        let db_path = tmp.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "redis://127.0.0.1:6379".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        mutate(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from_app_config(&cfg)));
        let cache = AppCache::new(
            Arc::new(InMemoryCache::new()),
            cfg.cache_namespace.clone(),
        );

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            cache,
            &cfg,
        );

        let redis_client = Arc::new(
            redis::Client::open(cfg.redis_url.clone()).expect("invalid redis url for tests"),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth: auth_service,
            redis: redis_client,
        };

        let router = Router::new()
            .nest("/api", storefront_api::api_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Seed a customer and return it with a valid session token.
    pub async fn seed_customer(&self, email: &str, role: CustomerRole) -> (customer::Model, String) {
        let now = Utc::now();
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            name: Set("Test Customer".to_string()),
            password_hash: Set(String::new()),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed customer");

        let token = self
            .state
            .auth
            .issue_token(&model)
            .expect("issue test token");
        (model, token)
    }

    pub async fn seed_address(&self, customer_id: Uuid) -> customer_address::Model {
        let now = Utc::now();
        customer_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            recipient_name: Set("Test Customer".to_string()),
            phone: Set(Some("+911234567890".to_string())),
            address_line_1: Set("42 Test Street".to_string()),
            address_line_2: Set(None),
            city: Set("Testville".to_string()),
            state: Set("TS".to_string()),
            postal_code: Set("560001".to_string()),
            country_code: Set("IN".to_string()),
            is_default: Set(true),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed address")
    }

    pub async fn seed_product(&self, sku: &str, price: Decimal, stock: i32) -> product::Model {
        self.seed_product_with(sku, price, stock, false).await
    }

    pub async fn seed_product_with(
        &self,
        sku: &str,
        price: Decimal,
        stock: i32,
        featured: bool,
    ) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(format!("Product {}", sku)),
            description: Set(Some("Seeded for integration tests".to_string())),
            sku: Set(sku.to_string()),
            price: Set(price),
            currency: Set("INR".to_string()),
            stock: Set(stock),
            is_featured: Set(featured),
            is_active: Set(true),
            image_url: Set(None),
            category: Set(Some("test".to_string())),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_cart_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> cart_item::Model {
        let now = Utc::now();
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(product_id),
            variant_id: Set(None),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed cart item")
    }

    /// Send a request against the router, authenticated via the session
    /// cookie when a token is given.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("cookie", format!("token={}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

/// Read a JSON body out of a response.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Assert helper: response status must match.
pub fn assert_status(response: &axum::response::Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "unexpected status for response"
    );
}
