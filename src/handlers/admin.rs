use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::AdminUser,
    entities::OrderStatus,
    errors::ServiceError,
    handlers::{common::PaginationParams, AppState},
    services::customers::{CustomerListResponse, DashboardSummary},
    services::orders::OrderListResponse,
    ApiResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderStatusFilter {
    /// Filter by order status (case-insensitive)
    pub status: Option<String>,
}

/// Paginated order listing for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(PaginationParams, OrderStatusFilter),
    responses(
        (status = 200, description = "Orders", body = crate::ApiResponse<OrderListResponse>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<OrderStatusFilter>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let status = match filter.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(OrderStatus::parse(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("unknown order status: {}", raw))
        })?),
    };

    let orders = state
        .services
        .orders
        .list_orders(pagination.page, pagination.per_page, status)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Paginated customer listing
#[utoipa::path(
    get,
    path = "/api/admin/customers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Customers", body = crate::ApiResponse<CustomerListResponse>),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<CustomerListResponse>>, ServiceError> {
    let customers = state
        .services
        .customers
        .list(pagination.page, pagination.per_page)
        .await?;
    Ok(Json(ApiResponse::success(customers)))
}

/// Download every customer as a CSV attachment
#[utoipa::path(
    post,
    path = "/api/admin/customers/export",
    responses(
        (status = 200, description = "CSV download", body = String, content_type = "text/csv"),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn export_customers(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, ServiceError> {
    let csv = state.services.customers.export_csv().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"customers.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Aggregate order/customer/revenue counters
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = crate::ApiResponse<DashboardSummary>),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<DashboardSummary>>, ServiceError> {
    let summary = state.services.customers.dashboard().await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/customers", get(list_customers))
        .route("/customers/export", post(export_customers))
        .route("/dashboard", get(dashboard))
}
