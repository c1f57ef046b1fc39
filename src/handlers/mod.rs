pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod chatbot;
pub mod common;
pub mod orders;
pub mod payments;
pub mod products;
pub mod wishlist;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::AppCache,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        addresses::AddressService, assistant::AssistantClient, cart::CartService,
        catalog::CatalogService, chatbot::ChatbotService, customers::CustomerService,
        gateway::RazorpayClient, orders::OrderService, payments::PaymentService,
        wishlist::WishlistService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub cart: Arc<CartService>,
    pub wishlist: Arc<WishlistService>,
    pub addresses: Arc<AddressService>,
    pub catalog: Arc<CatalogService>,
    pub customers: Arc<CustomerService>,
    pub chatbot: Arc<ChatbotService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        cache: AppCache,
        cfg: &AppConfig,
    ) -> Self {
        let gateway = match (&cfg.razorpay_key_id, &cfg.razorpay_key_secret) {
            (Some(key_id), Some(key_secret)) => Some(Arc::new(RazorpayClient::new(
                cfg.razorpay_api_url.clone(),
                key_id.clone(),
                key_secret.clone(),
            ))),
            _ => None,
        };
        let assistant = Arc::new(AssistantClient::new(
            cfg.assistant_api_url.clone(),
            cfg.assistant_api_key.clone(),
        ));

        let orders = Arc::new(OrderService::new(
            db.clone(),
            event_sender.clone(),
            cfg.default_currency.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            db.clone(),
            event_sender.clone(),
            gateway,
            cfg.razorpay_key_secret.clone(),
            cfg.default_currency.clone(),
        ));
        let cart = Arc::new(CartService::new(db.clone(), event_sender.clone()));
        let wishlist = Arc::new(WishlistService::new(db.clone(), event_sender.clone()));
        let addresses = Arc::new(AddressService::new(
            db.clone(),
            event_sender.clone(),
            cache.clone(),
            Duration::from_secs(cfg.cache_address_ttl_secs),
        ));
        let catalog = Arc::new(CatalogService::new(
            db.clone(),
            cache,
            Duration::from_secs(cfg.cache_search_ttl_secs),
            Duration::from_secs(cfg.cache_product_ttl_secs),
        ));
        let customers = Arc::new(CustomerService::new(db, event_sender));
        let chatbot = Arc::new(ChatbotService::new(orders.clone(), assistant));

        Self {
            orders,
            payments,
            cart,
            wishlist,
            addresses,
            catalog,
            customers,
            chatbot,
        }
    }
}
