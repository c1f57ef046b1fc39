use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::CustomerAddressModel,
    errors::ServiceError,
    handlers::AppState,
    services::addresses::{AddressListResponse, CreateAddressRequest, UpdateAddressRequest},
    ApiResponse,
};

/// List the caller's addresses (cache-aside read)
#[utoipa::path(
    get,
    path = "/api/account/addresses",
    responses(
        (status = 200, description = "Addresses with cache flag", body = crate::ApiResponse<AddressListResponse>)
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<AddressListResponse>>, ServiceError> {
    let addresses = state.services.addresses.list(user.customer_id).await?;
    Ok(Json(ApiResponse::success(addresses)))
}

/// Add a shipping address
#[utoipa::path(
    post,
    path = "/api/account/addresses",
    request_body = CreateAddressRequest,
    responses(
        (status = 201, description = "Address created", body = crate::ApiResponse<CustomerAddressModel>),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerAddressModel>>), ServiceError> {
    let address = state
        .services
        .addresses
        .create(user.customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(address))))
}

/// Patch an address; invalidates that customer's address cache
#[utoipa::path(
    patch,
    path = "/api/account/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = crate::ApiResponse<CustomerAddressModel>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
    Json(request): Json<UpdateAddressRequest>,
) -> Result<Json<ApiResponse<CustomerAddressModel>>, ServiceError> {
    let address = state
        .services
        .addresses
        .update(user.customer_id, address_id, request)
        .await?;
    Ok(Json(ApiResponse::success(address)))
}

/// Delete an address; invalidates that customer's address cache
#[utoipa::path(
    delete,
    path = "/api/account/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state
        .services
        .addresses
        .delete(user.customer_id, address_id)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", patch(update_address).delete(delete_address))
}
