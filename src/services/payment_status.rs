//! Provider payment-status classification.
//!
//! Gateways report status as free text; orders carry a closed enum.
//! `map_provider_status` is the one place that translation happens.

use crate::entities::order::OrderStatus;

/// Buckets a provider-reported payment status falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Failed,
    Pending,
}

/// Classifies a provider-reported status string, case-insensitively.
///
/// `AUTHORIZED` means the gateway holds the funds but has not captured
/// them, so it stays in the pending bucket. Anything unrecognized is
/// treated as pending rather than rejected.
pub fn classify_provider_status(status: &str) -> StatusClass {
    match status.trim().to_ascii_uppercase().as_str() {
        "COMPLETED" | "SUCCESS" | "PAID" | "CAPTURED" => StatusClass::Success,
        "FAILED" | "FAILURE" | "DECLINED" | "CANCELLED" => StatusClass::Failed,
        "AUTHORIZED" => StatusClass::Pending,
        _ => StatusClass::Pending,
    }
}

/// Maps a provider-reported status onto the internal order status.
///
/// Total over all inputs: the result is always exactly one of
/// CONFIRMED, PAYMENT_FAILED or PENDING. The provider name is accepted
/// for parity with the callback payload but the table is currently the
/// same for every provider.
pub fn map_provider_status(status: &str, _provider: &str) -> OrderStatus {
    match classify_provider_status(status) {
        StatusClass::Success => OrderStatus::Confirmed,
        StatusClass::Failed => OrderStatus::PaymentFailed,
        StatusClass::Pending => OrderStatus::Pending,
    }
}
