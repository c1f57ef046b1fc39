//! Payment gateway REST client.
//!
//! Talks to the gateway's order API directly over HTTP with basic auth;
//! amounts cross the wire in minor currency units. Failures surface as
//! upstream errors with the gateway's own message attached, and no call
//! is retried.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

use crate::errors::ServiceError;

/// Order created on the gateway, as returned by its API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateGatewayOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: Option<GatewayErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetails {
    description: Option<String>,
}

/// Converts a major-unit amount to the gateway's minor units (paise,
/// cents). Fractions beyond two decimals are rejected rather than
/// silently rounded.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    let scaled = amount * Decimal::from(100);
    if scaled.fract() != Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "amount {} has sub-minor-unit precision",
            amount
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError(format!("amount {} out of range", amount)))
}

/// Client for the payment gateway's REST API
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client construction cannot fail with static options"),
            base_url,
            key_id,
            key_secret,
        }
    }

    /// The public key half, needed by the client-side checkout widget.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Creates an order on the gateway. `amount` is in major units and is
    /// converted to minor units on the wire.
    #[instrument(skip(self), fields(currency = %currency))]
    pub async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        let amount_minor = to_minor_units(amount)?;
        let url = format!("{}/orders", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateGatewayOrderBody {
                amount: amount_minor,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("gateway request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let description = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|details| details.description)
                .unwrap_or_else(|| format!("gateway returned {}", status));
            return Err(ServiceError::ExternalServiceError(description));
        }

        let order = response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("gateway response: {}", e)))?;

        info!(gateway_order_id = %order.id, amount_minor, "gateway order created");
        Ok(order)
    }
}
