//! Notifier boundary
//!
//! Transactional messages sent after lifecycle operations commit. Delivery
//! failures are logged by the engine and never abort the operation.

use async_trait::async_trait;
use shared::models::{Order, User};
use thiserror::Error;

/// Notification delivery failures
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Transactional notification interface
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(&self, order: &Order, user: &User) -> Result<(), NotifyError>;
    async fn send_order_status_update(&self, order: &Order, user: &User)
        -> Result<(), NotifyError>;
    async fn send_refund_confirmation(&self, order: &Order, user: &User)
        -> Result<(), NotifyError>;
}

/// Notifier that records messages to the log instead of delivering them
///
/// Useful for development and embedded deployments without an SMTP relay.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_order_confirmation(&self, order: &Order, user: &User) -> Result<(), NotifyError> {
        tracing::info!(order_id = ?order.id, email = %user.email, "Order confirmation");
        Ok(())
    }

    async fn send_order_status_update(
        &self,
        order: &Order,
        user: &User,
    ) -> Result<(), NotifyError> {
        tracing::info!(order_id = ?order.id, email = %user.email, status = ?order.status, "Order status update");
        Ok(())
    }

    async fn send_refund_confirmation(
        &self,
        order: &Order,
        user: &User,
    ) -> Result<(), NotifyError> {
        tracing::info!(order_id = ?order.id, email = %user.email, "Refund confirmation");
        Ok(())
    }
}
