use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::cart::{AddToCartRequest, CartResponse, RemoveFromCartRequest},
    ApiResponse,
};

/// Fetch the caller's cart
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart contents", body = crate::ApiResponse<CartResponse>)
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.cart.get_cart(user.customer_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Add an item (or increase its quantity)
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = crate::ApiResponse<CartResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state
        .services
        .cart
        .add_item(user.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Remove one row, or clear the cart when no product is named
#[utoipa::path(
    delete,
    path = "/api/cart",
    request_body = RemoveFromCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = crate::ApiResponse<CartResponse>)
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state
        .services
        .cart
        .remove_item(user.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::success(cart)))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(get_cart).post(add_to_cart).delete(remove_from_cart))
}
