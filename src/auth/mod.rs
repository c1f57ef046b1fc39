/*!
 * # Authentication and Authorization Module
 *
 * Session tokens are HS256 JWTs carried in a cookie set at login; a
 * `Bearer` header is accepted as a fallback for non-browser clients.
 * Authorization is a single role claim: `admin` unlocks the admin
 * routes, everything else is a regular customer session.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{customer, CustomerRole};

/// Claim structure for session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // Subject (customer ID)
    pub email: String,   // Customer email
    pub role: String,    // Role claim ("customer" | "admin")
    pub jti: String,     // Unique token identifier
    pub iat: i64,        // Issued at
    pub exp: i64,        // Expiration
    pub nbf: i64,        // Not valid before
    pub iss: String,     // Issuer
    pub aud: String,     // Audience
}

/// Authenticated caller extracted from the session token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub customer_id: Uuid,
    pub email: String,
    pub role: CustomerRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == CustomerRole::Admin
    }
}

/// Authenticated caller that additionally carries the admin role.
/// Extraction fails with 403 for a valid non-admin session.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_expiration: Duration,
    pub cookie_name: String,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        issuer: String,
        audience: String,
        token_expiration: Duration,
        cookie_name: String,
    ) -> Self {
        Self {
            jwt_secret,
            issuer,
            audience,
            token_expiration,
            cookie_name,
        }
    }

    pub fn from_app_config(cfg: &crate::config::AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
            cfg.auth_cookie_name.clone(),
        )
    }
}

/// Issues and validates session tokens
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate a signed session token for a customer
    pub fn issue_token(&self, customer: &customer::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let role = match customer.role {
            CustomerRole::Admin => "admin",
            CustomerRole::Customer => "customer",
        };

        let claims = Claims {
            sub: customer.id.to_string(),
            email: customer.email.clone(),
            role: role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a session token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_nbf = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
    }

    /// Hash a password for storage
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::InternalError(format!("password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AuthError::InternalError(format!("stored hash unreadable: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn auth_user_from_claims(&self, claims: Claims) -> Result<AuthUser, AuthError> {
        let customer_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let role = match claims.role.as_str() {
            "admin" => CustomerRole::Admin,
            _ => CustomerRole::Customer,
        };
        Ok(AuthUser {
            customer_id,
            email: claims.email,
            role,
        })
    }
}

/// Pulls the session token out of the cookie (preferred) or a Bearer header.
fn token_from_parts(parts: &Parts, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl axum::extract::FromRequestParts<crate::AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = &state.auth;
        let token = token_from_parts(parts, &auth.config.cookie_name)
            .ok_or(AuthError::MissingToken)?;
        let claims = auth.validate_token(&token)?;
        auth.auth_user_from_claims(claims)
    }
}

#[async_trait]
impl axum::extract::FromRequestParts<crate::AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(AdminUser(user))
    }
}

/// Authentication and authorization failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication token missing")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("Authentication token expired")]
    ExpiredToken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Token creation failed: {0}")]
    TokenCreation(String),
    #[error("Internal auth error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::InvalidToken
            | Self::ExpiredToken
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Never leak internals to the caller
            Self::TokenCreation(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = crate::errors::ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            request_id: crate::telemetry::current_request_id().map(|r| r.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "unit_test_secret_that_is_long_enough_for_hs256_0123456789abcdef".into(),
            "storefront-api".into(),
            "storefront".into(),
            Duration::from_secs(3600),
            "token".into(),
        ))
    }

    fn sample_customer(role: CustomerRole) -> customer::Model {
        customer::Model {
            id: Uuid::new_v4(),
            email: "jo@example.com".into(),
            name: "Jo".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn issued_token_validates_and_carries_role() {
        let svc = service();
        let admin = sample_customer(CustomerRole::Admin);

        let token = svc.issue_token(&admin).unwrap();
        let claims = svc.validate_token(&token).unwrap();

        assert_eq!(claims.sub, admin.id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, "storefront-api");

        let user = svc.auth_user_from_claims(claims).unwrap();
        assert!(user.is_admin());
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let svc = service();
        let other = AuthService::new(AuthConfig::new(
            "a_completely_different_secret_that_is_also_long_enough_zyxwvu987".into(),
            "storefront-api".into(),
            "storefront".into(),
            Duration::from_secs(3600),
            "token".into(),
        ));

        let token = other
            .issue_token(&sample_customer(CustomerRole::Customer))
            .unwrap();
        assert!(matches!(
            svc.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn password_hash_round_trip() {
        let svc = service();
        let hash = svc.hash_password("hunter2!").unwrap();
        assert!(svc.verify_password("hunter2!", &hash).unwrap());
        assert!(!svc.verify_password("wrong", &hash).unwrap());
    }
}
