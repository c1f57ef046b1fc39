//! Payment session initiation and gateway callback reconciliation.
//!
//! Reconciliation preserves the observed behavior of the checkout flow
//! this API serves, including its asymmetries: a callback with no prior
//! payment row creates one without signature verification, and repeated
//! callbacks apply last-write-wins. Both are recorded in DESIGN.md.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        customer::Entity as CustomerEntity,
        customer_address::{self, Entity as AddressEntity},
        order::{self, Entity as OrderEntity, OrderStatus},
        payment::{self, Entity as PaymentEntity, Model as PaymentModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::gateway::{to_minor_units, RazorpayClient},
    services::payment_status::{classify_provider_status, map_provider_status, StatusClass},
};

type HmacSha256 = Hmac<Sha256>;

pub const RAZORPAY_PROVIDER: &str = "razorpay";

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
}

/// Everything the client-side checkout widget needs to open the gateway
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub key_id: String,
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub prefill: CheckoutPrefill,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutPrefill {
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentCallbackRequest {
    pub order_id: Uuid,
    pub provider_payment_id: String,
    pub status: String,
    pub provider: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub provider: String,
    pub provider_payment_id: Option<String>,
    pub status: String,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Recomputes the callback signature and compares it in constant time.
/// The signed payload is `gateway_order_id|provider_payment_id`.
pub fn verify_callback_signature(
    secret: &str,
    gateway_order_id: &str,
    provider_payment_id: &str,
    supplied_signature: &str,
) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(format!("{}|{}", gateway_order_id, provider_payment_id).as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, supplied_signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

/// Merges `incoming` object keys over `existing` ones. Nothing is ever
/// removed; non-object inputs leave the existing bag untouched.
fn merge_metadata(existing: Option<Value>, incoming: Option<&Value>) -> Option<Value> {
    let mut base = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Some(Value::Object(new_entries)) = incoming {
        for (key, value) in new_entries {
            base.insert(key.clone(), value.clone());
        }
    }
    if base.is_empty() {
        None
    } else {
        Some(Value::Object(base))
    }
}

/// A metadata-supplied `order_status` wins over the computed mapping
/// when it names a known status.
fn status_override(metadata: Option<&Value>) -> Option<OrderStatus> {
    metadata
        .and_then(|m| m.get("order_status"))
        .and_then(|v| v.as_str())
        .and_then(OrderStatus::parse)
}

#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    gateway: Option<Arc<RazorpayClient>>,
    callback_secret: Option<String>,
    default_currency: String,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Option<Arc<RazorpayClient>>,
        callback_secret: Option<String>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            callback_secret,
            default_currency,
        }
    }

    /// Creates a gateway session for one of the caller's orders and
    /// records a PENDING payment row.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn initiate_session(
        &self,
        customer_id: Uuid,
        request: InitiatePaymentRequest,
    ) -> Result<CheckoutSessionResponse, ServiceError> {
        let order = OrderEntity::find_by_id(request.order_id)
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;

        let gateway = self.gateway.as_ref().ok_or_else(|| {
            ServiceError::ConfigurationError(
                "payment gateway credentials are not configured".to_string(),
            )
        })?;

        let currency = request
            .currency
            .unwrap_or_else(|| self.default_currency.clone());

        let gateway_order = gateway
            .create_order(request.amount, &currency, &order.id.to_string())
            .await?;

        let now = Utc::now();
        let payment_id = Uuid::new_v4();
        let metadata = serde_json::json!({ "razorpay_order_id": gateway_order.id });

        payment::ActiveModel {
            id: Set(payment_id),
            order_id: Set(order.id),
            customer_id: Set(customer_id),
            amount: Set(request.amount),
            currency: Set(currency.clone()),
            provider: Set(RAZORPAY_PROVIDER.to_string()),
            provider_payment_id: Set(None),
            status: Set("PENDING".to_string()),
            metadata: Set(Some(metadata)),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(payment_id = %payment_id, gateway_order_id = %gateway_order.id, "payment session initiated");
        self.event_sender
            .send_or_log(Event::PaymentSessionInitiated {
                order_id: order.id,
                payment_id,
            })
            .await;

        let (name, email, contact) = self.prefill_for(&order).await?;

        Ok(CheckoutSessionResponse {
            key_id: gateway.key_id().to_string(),
            gateway_order_id: gateway_order.id,
            amount_minor: to_minor_units(request.amount)?,
            currency,
            prefill: CheckoutPrefill {
                name,
                email,
                contact,
            },
        })
    }

    async fn prefill_for(
        &self,
        order: &order::Model,
    ) -> Result<(String, String, Option<String>), ServiceError> {
        let customer = CustomerEntity::find_by_id(order.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", order.customer_id))
            })?;
        let address = AddressEntity::find_by_id(order.address_id)
            .filter(customer_address::Column::CustomerId.eq(order.customer_id))
            .one(&*self.db)
            .await?;

        Ok((
            customer.name,
            customer.email,
            address.and_then(|a| a.phone),
        ))
    }

    /// Applies a gateway callback: reconciles the payment row and maps
    /// the reported status onto the order. See module docs for the
    /// preserved asymmetries.
    #[instrument(skip(self, request), fields(order_id = %request.order_id, status = %request.status))]
    pub async fn handle_callback(
        &self,
        customer_id: Uuid,
        request: PaymentCallbackRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        let provider = request
            .provider
            .clone()
            .unwrap_or_else(|| RAZORPAY_PROVIDER.to_string());

        let txn = self.db.begin().await?;

        let order = OrderEntity::find_by_id(request.order_id)
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;

        let existing = PaymentEntity::find()
            .filter(payment::Column::OrderId.eq(request.order_id))
            .filter(payment::Column::CustomerId.eq(customer_id))
            .order_by_desc(payment::Column::CreatedAt)
            .one(&txn)
            .await?;

        let mapped_status = status_override(request.metadata.as_ref())
            .unwrap_or_else(|| map_provider_status(&request.status, &provider));

        let payment_model = match existing {
            None => {
                // First contact from the gateway for this order: record it
                // as reported. This branch has no signature to check
                // against because no session was initiated on our side.
                warn!(order_id = %request.order_id, "callback for unknown payment; creating row");
                let now = Utc::now();
                payment::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order.id),
                    customer_id: Set(customer_id),
                    amount: Set(order.total_amount),
                    currency: Set(order.currency.clone()),
                    provider: Set(provider.clone()),
                    provider_payment_id: Set(Some(request.provider_payment_id.clone())),
                    status: Set(request.status.clone()),
                    metadata: Set(merge_metadata(None, request.metadata.as_ref())),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                }
                .insert(&txn)
                .await?
            }
            Some(existing) => {
                // Success reports from the signature-capable gateway must
                // carry a valid signature; failed/pending callbacks are
                // accepted as-is.
                if provider == RAZORPAY_PROVIDER
                    && classify_provider_status(&request.status) == StatusClass::Success
                {
                    self.enforce_signature(&existing, &request)?;
                }

                let merged =
                    merge_metadata(existing.metadata.clone(), request.metadata.as_ref());
                let mut active: payment::ActiveModel = existing.into();
                active.status = Set(request.status.clone());
                active.provider_payment_id = Set(Some(request.provider_payment_id.clone()));
                active.metadata = Set(merged);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?
            }
        };

        let old_status = order.status;
        let mut order_active: order::ActiveModel = order.into();
        order_active.status = Set(mapped_status);
        order_active.updated_at = Set(Some(Utc::now()));
        let updated_order = order_active.update(&txn).await?;

        txn.commit().await?;

        info!(
            order_id = %updated_order.id,
            payment_id = %payment_model.id,
            from = %old_status,
            to = %mapped_status,
            "payment callback applied"
        );
        self.event_sender
            .send_or_log(Event::PaymentReconciled {
                order_id: updated_order.id,
                payment_id: payment_model.id,
                provider_status: request.status.clone(),
            })
            .await;
        if old_status != mapped_status {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: updated_order.id,
                    old_status,
                    new_status: mapped_status,
                })
                .await;
        }

        Ok(Self::to_response(payment_model, mapped_status))
    }

    fn enforce_signature(
        &self,
        existing: &PaymentModel,
        request: &PaymentCallbackRequest,
    ) -> Result<(), ServiceError> {
        let metadata = request.metadata.as_ref();
        let gateway_order_id = metadata
            .and_then(|m| m.get("razorpay_order_id"))
            .and_then(|v| v.as_str())
            .or_else(|| {
                existing
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("razorpay_order_id"))
                    .and_then(|v| v.as_str())
            });
        let signature = metadata
            .and_then(|m| m.get("razorpay_signature"))
            .and_then(|v| v.as_str());

        // Only verify when the expected fields are actually present,
        // matching the gateway's documented success payload
        let (Some(gateway_order_id), Some(signature)) = (gateway_order_id, signature) else {
            return Ok(());
        };

        let secret = self.callback_secret.as_deref().ok_or_else(|| {
            ServiceError::ConfigurationError("payment callback secret is not configured".into())
        })?;

        if !verify_callback_signature(
            secret,
            gateway_order_id,
            &request.provider_payment_id,
            signature,
        ) {
            warn!(order_id = %request.order_id, "callback signature mismatch");
            return Err(ServiceError::InvalidSignature);
        }
        Ok(())
    }

    fn to_response(model: PaymentModel, order_status: OrderStatus) -> PaymentResponse {
        PaymentResponse {
            id: model.id,
            order_id: model.order_id,
            amount: model.amount,
            currency: model.currency,
            provider: model.provider,
            provider_payment_id: model.provider_payment_id,
            status: model.status,
            order_status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_over_order_and_payment_id() {
        let secret = "callback_secret";
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(b"order_ABC|pay_123");
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_callback_signature(
            secret, "order_ABC", "pay_123", &signature
        ));
        assert!(!verify_callback_signature(
            secret, "order_ABC", "pay_999", &signature
        ));
        assert!(!verify_callback_signature(
            "other", "order_ABC", "pay_123", &signature
        ));
    }

    #[test]
    fn constant_time_eq_requires_equal_length() {
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("abcd", "abcd"));
        assert!(!constant_time_eq("abcd", "abce"));
    }

    #[test]
    fn metadata_merge_keeps_existing_keys() {
        let existing = serde_json::json!({"a": 1, "b": "old"});
        let incoming = serde_json::json!({"b": "new", "c": true});

        let merged = merge_metadata(Some(existing), Some(&incoming)).unwrap();
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], "new");
        assert_eq!(merged["c"], true);
    }

    #[test]
    fn metadata_merge_ignores_non_object_input() {
        let existing = serde_json::json!({"a": 1});
        let merged = merge_metadata(Some(existing), Some(&serde_json::json!("junk"))).unwrap();
        assert_eq!(merged, serde_json::json!({"a": 1}));

        assert!(merge_metadata(None, None).is_none());
    }

    #[test]
    fn override_wins_only_for_known_statuses() {
        let meta = serde_json::json!({"order_status": "SHIPPED"});
        assert_eq!(status_override(Some(&meta)), Some(OrderStatus::Shipped));

        let junk = serde_json::json!({"order_status": "NOT_A_STATUS"});
        assert_eq!(status_override(Some(&junk)), None);
        assert_eq!(status_override(None), None);
    }
}
