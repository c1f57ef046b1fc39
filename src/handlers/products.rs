use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::catalog::{CachedProductPage, ProductSearchQuery},
    ApiResponse,
};

/// Search the catalog (cache-aside read)
#[utoipa::path(
    get,
    path = "/api/products/search",
    params(ProductSearchQuery),
    responses(
        (status = 200, description = "Matching products with cache flag", body = crate::ApiResponse<CachedProductPage>)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<ProductSearchQuery>,
) -> Result<Json<ApiResponse<CachedProductPage>>, ServiceError> {
    let result = state.services.catalog.search(query).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Featured products (cache-aside read)
#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Featured products with cache flag", body = crate::ApiResponse<CachedProductPage>)
    ),
    tag = "Products"
)]
pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CachedProductPage>>, ServiceError> {
    let result = state.services.catalog.featured().await?;
    Ok(Json(ApiResponse::success(result)))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_products))
        .route("/featured", get(featured_products))
}
