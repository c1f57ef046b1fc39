use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.3.0",
        description = r#"
Backend API for the storefront: orders, payments, cart, wishlist,
catalog search, and admin tooling.

## Authentication

Log in via `POST /api/auth/login` to receive the session cookie; an
`Authorization: Bearer <token>` header works for non-browser clients.
Admin routes additionally require the `admin` role claim.

## Rate limiting

Requests are limited per client address in fixed windows. Denied
requests carry `Retry-After` plus `X-RateLimit-*` headers.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Session management"),
        (name = "Orders", description = "Order placement and history"),
        (name = "Payments", description = "Gateway sessions and callbacks"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Wishlist", description = "Wishlist"),
        (name = "Addresses", description = "Address book"),
        (name = "Products", description = "Catalog reads"),
        (name = "Admin", description = "Admin listings, exports and dashboards"),
        (name = "Chatbot", description = "Support chat")
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_my_orders,
        crate::handlers::orders::get_order,
        crate::handlers::payments::initiate_razorpay,
        crate::handlers::payments::payment_callback,
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_to_cart,
        crate::handlers::cart::remove_from_cart,
        crate::handlers::wishlist::get_wishlist,
        crate::handlers::wishlist::add_to_wishlist,
        crate::handlers::wishlist::remove_from_wishlist,
        crate::handlers::addresses::list_addresses,
        crate::handlers::addresses::create_address,
        crate::handlers::addresses::update_address,
        crate::handlers::addresses::delete_address,
        crate::handlers::products::search_products,
        crate::handlers::products::featured_products,
        crate::handlers::admin::list_orders,
        crate::handlers::admin::list_customers,
        crate::handlers::admin::export_customers,
        crate::handlers::admin::dashboard,
        crate::handlers::chatbot::chat,
    ),
    modifiers(&SessionCookieSecurity)
)]
pub struct ApiDoc;

struct SessionCookieSecurity;

impl Modify for SessionCookieSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/orders"));
        assert!(json.contains("/api/payment/callback"));
    }
}
