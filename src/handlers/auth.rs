use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::customers::CustomerSummary,
    ApiResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.config.auth_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .build()
}

/// Register a new customer account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerSummary>>), ServiceError> {
    request.validate()?;

    let password_hash = state
        .auth
        .hash_password(&request.password)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    let created = state
        .services
        .customers
        .register(request.email, request.name, password_hash)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CustomerSummary::from(created))),
    ))
}

/// Log in and receive the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set"),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<CustomerSummary>>), ServiceError> {
    let customer = state
        .services
        .customers
        .find_by_email(&request.email)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = state
        .auth
        .verify_password(&request.password, &customer.password_hash)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    if !valid {
        return Err(ServiceError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = state
        .auth
        .issue_token(&customer)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    let jar = jar.add(session_cookie(&state, token));
    Ok((jar, Json(ApiResponse::success(CustomerSummary::from(customer)))))
}

/// Log out by clearing the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cookie cleared")),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let removal = Cookie::build(state.config.auth_cookie_name.clone())
        .path("/")
        .build();
    let jar = jar.remove(removal);
    (jar, Json(ApiResponse::success(())))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
