use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::wishlist::{WishlistEntry, WishlistMutationRequest},
    ApiResponse,
};

/// List the caller's wishlist
#[utoipa::path(
    get,
    path = "/api/account/wishlist",
    responses(
        (status = 200, description = "Wishlist", body = crate::ApiResponse<Vec<WishlistEntry>>)
    ),
    security(("session_cookie" = [])),
    tag = "Wishlist"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<WishlistEntry>>>, ServiceError> {
    let entries = state.services.wishlist.list(user.customer_id).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Add a product to the wishlist (idempotent per product)
#[utoipa::path(
    post,
    path = "/api/account/wishlist",
    request_body = WishlistMutationRequest,
    responses(
        (status = 200, description = "Updated wishlist", body = crate::ApiResponse<Vec<WishlistEntry>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<WishlistMutationRequest>,
) -> Result<Json<ApiResponse<Vec<WishlistEntry>>>, ServiceError> {
    let entries = state
        .services
        .wishlist
        .add(user.customer_id, request.product_id)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Remove a product from the wishlist
#[utoipa::path(
    delete,
    path = "/api/account/wishlist",
    request_body = WishlistMutationRequest,
    responses(
        (status = 200, description = "Updated wishlist", body = crate::ApiResponse<Vec<WishlistEntry>>)
    ),
    security(("session_cookie" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<WishlistMutationRequest>,
) -> Result<Json<ApiResponse<Vec<WishlistEntry>>>, ServiceError> {
    let entries = state
        .services
        .wishlist
        .remove(user.customer_id, request.product_id)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

pub fn wishlist_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_wishlist)
            .post(add_to_wishlist)
            .delete(remove_from_wishlist),
    )
}
