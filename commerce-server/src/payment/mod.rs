//! Payment Gateway boundary
//!
//! The engine talks to the payment processor through [`PaymentGateway`].
//! Amounts cross this boundary as minor units (cents): decimal currency
//! values are converted with [`minor_units`] and never as floats.

use async_trait::async_trait;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payment authorization created by the gateway
///
/// `client_secret` is handed back to the caller so the charge can be
/// confirmed on the client side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub id: String,
    pub client_secret: String,
    pub status: String,
}

/// Refund issued by the gateway against a prior authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub id: String,
    pub status: String,
}

/// Gateway call failures
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Payment processor interface
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment authorization for an amount in minor units
    async fn create_authorization(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentAuthorization, GatewayError>;

    /// Issue a refund against a prior authorization
    async fn create_refund(
        &self,
        authorization_id: &str,
        amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError>;
}

/// Gateway that approves every request
///
/// Development stand-in for a real processor, paired with [`MemoryStore`]
/// and [`LogNotifier`] in the embedded stack.
///
/// [`MemoryStore`]: crate::store::MemoryStore
/// [`LogNotifier`]: crate::notify::LogNotifier
#[derive(Debug, Default, Clone)]
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_authorization(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let id = format!("auth_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(amount_minor, currency, authorization_id = %id, "Sandbox authorization");
        Ok(PaymentAuthorization {
            client_secret: format!("{}_secret", id),
            id,
            status: "requires_confirmation".to_string(),
        })
    }

    async fn create_refund(
        &self,
        authorization_id: &str,
        amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError> {
        let id = format!("re_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(amount_minor, authorization_id, refund_id = %id, "Sandbox refund");
        Ok(RefundReceipt {
            id,
            status: "succeeded".to_string(),
        })
    }
}

/// Convert a decimal currency amount to the gateway's minor-unit integer
/// representation (multiply by 100, round midpoint away from zero).
///
/// Returns `None` when the amount is too large to represent, which the
/// engine rejects as invalid input.
pub fn minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
