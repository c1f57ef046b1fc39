use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::orders::{CreateOrderRequest, OrderResponse},
    ApiResponse,
};

/// Place an order from the submitted line items
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = crate::ApiResponse<OrderResponse>),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address, product or variant not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let order = state
        .services
        .orders
        .create_order(user.customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// List the caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders", body = crate::ApiResponse<Vec<OrderResponse>>)
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .orders
        .list_orders_for_customer(user.customer_id)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Fetch one of the caller's orders with its items
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = crate::ApiResponse<OrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .orders
        .get_order_for_customer(user.customer_id, order_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_my_orders))
        .route("/:id", get(get_order))
}
