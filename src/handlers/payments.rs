use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::payments::{
        CheckoutSessionResponse, InitiatePaymentRequest, PaymentCallbackRequest, PaymentResponse,
    },
    ApiResponse,
};

/// Open a gateway checkout session for an order
#[utoipa::path(
    post,
    path = "/api/payment/razorpay",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Checkout session", body = crate::ApiResponse<CheckoutSessionResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Gateway not configured", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway error", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Payments"
)]
pub async fn initiate_razorpay(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<Json<ApiResponse<CheckoutSessionResponse>>, ServiceError> {
    let session = state
        .services
        .payments
        .initiate_session(user.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::success(session)))
}

/// Apply a gateway payment callback to the order
#[utoipa::path(
    post,
    path = "/api/payment/callback",
    request_body = PaymentCallbackRequest,
    responses(
        (status = 200, description = "Callback applied", body = crate::ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Payments"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PaymentCallbackRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    let payment = state
        .services
        .payments
        .handle_callback(user.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/razorpay", post(initiate_razorpay))
        .route("/callback", post(payment_callback))
}
