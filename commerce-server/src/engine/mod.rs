//! Order Lifecycle Engine
//!
//! The engine drives orders through their lifecycle:
//!
//! ```text
//!   place_order ──► Placed ──► mark_delivered ──► Delivered
//!                     │
//!                     ├──► cancel_order ──► Canceled  (restocks)
//!                     │
//!                     └──► refund_order ──► Refunded  (restocks, paid only)
//! ```
//!
//! Invariants the engine enforces:
//! - Stock never goes negative: checks and debits serialize per product.
//! - Orders are only persisted with a payment authorization attached.
//! - Refund happens at most once per order.
//! - Every operation passes the owner-or-admin gate.

mod error;
mod locks;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult};

use crate::core::Config;
use crate::notify::Notifier;
use crate::payment::{minor_units, GatewayError, PaymentGateway};
use crate::store::{MemoryStore, OrderRepository, ProductRepository, UserRepository};
use chrono::Utc;
use locks::LockRegistry;
use shared::models::{
    Actor, Order, OrderCreate, OrderItem, OrderStatus, PaymentConfirmation, PaymentResult,
    Product, RefundResult, User,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Result of a successful placement
///
/// The `client_secret` lets the caller confirm the charge with the gateway.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub client_secret: String,
}

/// Order lifecycle engine
///
/// Owns the external collaborators behind trait objects and two lock
/// registries: per-product locks serialize stock mutation, per-order locks
/// serialize the transition guards against concurrent calls on one order.
pub struct OrderEngine {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    stock_locks: LockRegistry,
    order_locks: LockRegistry,
    config: Config,
}

impl OrderEngine {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        Self {
            products,
            orders,
            users,
            gateway,
            notifier,
            stock_locks: LockRegistry::new(),
            order_locks: LockRegistry::new(),
            config,
        }
    }

    /// Build an engine backed by a single [`MemoryStore`] for all repositories
    pub fn with_store(
        store: Arc<MemoryStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store,
            gateway,
            notifier,
            config,
        )
    }

    /// Place a new order
    ///
    /// Validates the requested items against current stock, debits stock,
    /// requests a payment authorization, and persists the order in `Placed`
    /// state. If the gateway declines or times out, the stock debits are
    /// rolled back and the order is never persisted.
    pub async fn place_order(
        &self,
        actor: &Actor,
        input: OrderCreate,
    ) -> EngineResult<PlacedOrder> {
        // 1. Validate input shape. The gateway amount is computed here so an
        //    out-of-range total fails before any stock is touched.
        if input.items.is_empty() {
            return Err(EngineError::EmptyOrder);
        }
        for item in &input.items {
            if item.quantity == 0 {
                return Err(EngineError::Validation(format!(
                    "Quantity for product {} must be positive",
                    item.product
                )));
            }
        }
        let amount = minor_units(input.total_price).ok_or_else(|| {
            EngineError::Validation("Order total is out of range".to_string())
        })?;

        // 2. Serialize stock mutation for the touched products
        let ids: Vec<&str> = input.items.iter().map(|i| i.product.as_str()).collect();
        let _guards = self.stock_locks.acquire(&ids).await;

        // 3. Load each distinct product once
        let mut products: HashMap<String, Product> = HashMap::new();
        for item in &input.items {
            if !products.contains_key(&item.product) {
                let product = self
                    .products
                    .find_by_id(&item.product)
                    .await?
                    .ok_or_else(|| EngineError::ProductNotFound(item.product.clone()))?;
                products.insert(item.product.clone(), product);
            }
        }

        // 4. Check stock and debit the in-memory copies. Every item is
        //    validated before anything is persisted, so duplicate line items
        //    for one product are checked against their aggregate quantity.
        for item in &input.items {
            let product = products
                .get_mut(&item.product)
                .ok_or_else(|| EngineError::ProductNotFound(item.product.clone()))?;
            if product.count_in_stock < item.quantity {
                return Err(EngineError::InsufficientStock(item.product.clone()));
            }
            product.count_in_stock -= item.quantity;
        }

        // 5. Commit the debits
        for product in products.values() {
            self.products.save(product).await?;
        }

        // 6. Request a payment authorization for the order total
        let authorization = match self
            .gateway_call(self.gateway.create_authorization(amount, &self.config.currency))
            .await
        {
            Ok(authorization) => authorization,
            Err(err) => {
                self.restore_debits(&input, &mut products).await;
                return Err(err);
            }
        };

        // 7. Persist the order with item names and prices snapshotted
        let items = input
            .items
            .iter()
            .map(|item| {
                let product = products
                    .get(&item.product)
                    .ok_or_else(|| EngineError::ProductNotFound(item.product.clone()))?;
                Ok(OrderItem {
                    product: item.product.clone(),
                    name: product.name.clone(),
                    quantity: item.quantity,
                    price: product.price,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let order = Order {
            id: None,
            user: actor.user_id.clone(),
            items,
            shipping_address: input.shipping_address,
            payment_method: input.payment_method,
            items_price: input.items_price,
            tax_price: input.tax_price,
            shipping_price: input.shipping_price,
            total_price: input.total_price,
            status: OrderStatus::Placed,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            is_refunded: false,
            refunded_at: None,
            canceled_at: None,
            payment_result: PaymentResult {
                id: authorization.id.clone(),
                status: "pending".to_string(),
                update_time: None,
                payer_email: None,
            },
            refund_result: None,
            created_at: Some(Utc::now()),
        };
        let order = match self.orders.create(order).await {
            Ok(order) => order,
            Err(err) => {
                // The authorization is already out; surface its id so the
                // operator can void it at the gateway.
                tracing::error!(
                    authorization_id = %authorization.id,
                    error = %err,
                    "Order persistence failed after payment authorization"
                );
                return Err(err.into());
            }
        };
        tracing::info!(order_id = ?order.id, user = %order.user, "Order placed");

        // 8. Confirmation email is best-effort
        self.notify(&order, NotifyKind::Confirmation).await;

        Ok(PlacedOrder {
            order,
            client_secret: authorization.client_secret,
        })
    }

    /// Record a payment confirmation from the gateway callback
    ///
    /// Overwrites `payment_result` with the confirmation payload; a repeated
    /// callback simply overwrites it again.
    pub async fn mark_paid(
        &self,
        actor: &Actor,
        order_id: &str,
        confirmation: PaymentConfirmation,
    ) -> EngineResult<Order> {
        // 1. Serialize transitions on this order, then load and gate
        let _order_guard = self.order_locks.acquire_one(order_id).await;
        let mut order = self.load_order(order_id).await?;
        authorize(actor, &order)?;

        // 2. Apply
        order.is_paid = true;
        order.paid_at = Some(Utc::now());
        order.payment_result = PaymentResult {
            id: confirmation.id,
            status: confirmation.status,
            update_time: confirmation.update_time,
            payer_email: confirmation.payer_email,
        };

        // 3. Persist and notify
        self.orders.save(&order).await?;
        tracing::info!(order_id = %order_id, "Order marked paid");
        self.notify(&order, NotifyKind::StatusUpdate).await;
        Ok(order)
    }

    /// Mark an order as delivered
    pub async fn mark_delivered(&self, actor: &Actor, order_id: &str) -> EngineResult<Order> {
        // 1. Serialize transitions on this order, then load and gate
        let _order_guard = self.order_locks.acquire_one(order_id).await;
        let mut order = self.load_order(order_id).await?;
        authorize(actor, &order)?;

        // 2. Apply
        order.is_delivered = true;
        order.delivered_at = Some(Utc::now());
        order.status = OrderStatus::Delivered;

        // 3. Persist and notify
        self.orders.save(&order).await?;
        tracing::info!(order_id = %order_id, "Order marked delivered");
        self.notify(&order, NotifyKind::StatusUpdate).await;
        Ok(order)
    }

    /// Cancel a placed order and restore its stock
    ///
    /// Only `Placed` orders can be canceled; shipped, delivered, canceled and
    /// refunded orders are rejected. Payment state is left untouched.
    pub async fn cancel_order(&self, actor: &Actor, order_id: &str) -> EngineResult<Order> {
        // 1. Serialize transitions on this order, then load and gate. The
        //    lock is held through the save so a concurrent cancel cannot
        //    pass the guard on the stale status.
        let _order_guard = self.order_locks.acquire_one(order_id).await;
        let mut order = self.load_order(order_id).await?;
        authorize(actor, &order)?;

        // 2. Transition guard. Canceled and Refunded are rejected too, so an
        //    order can never be restocked twice.
        if order.status != OrderStatus::Placed {
            return Err(EngineError::InvalidTransition(format!(
                "Order cannot be canceled in status {:?}",
                order.status
            )));
        }

        // 3. Restock before the status flips
        self.restock_items(&order.items).await?;

        // 4. Apply and persist
        order.status = OrderStatus::Canceled;
        order.canceled_at = Some(Utc::now());
        self.orders.save(&order).await?;
        tracing::info!(order_id = %order_id, "Order canceled");

        // 5. Notify
        self.notify(&order, NotifyKind::StatusUpdate).await;
        Ok(order)
    }

    /// Refund a paid order through the gateway and restore its stock
    pub async fn refund_order(&self, actor: &Actor, order_id: &str) -> EngineResult<Order> {
        // 1. Serialize transitions on this order, then load and gate. The
        //    lock is held across the gateway call and the save, otherwise
        //    two concurrent refunds would both pass the guard below and
        //    move money twice.
        let _order_guard = self.order_locks.acquire_one(order_id).await;
        let mut order = self.load_order(order_id).await?;
        authorize(actor, &order)?;

        // 2. Refund guard: paid exactly once
        if !order.is_paid || order.is_refunded {
            return Err(EngineError::InvalidTransition(
                "Order cannot be refunded".to_string(),
            ));
        }

        // 3. Gateway refund first; the order is untouched if it fails
        let amount = minor_units(order.total_price).ok_or_else(|| {
            EngineError::Validation("Order total is out of range".to_string())
        })?;
        let receipt = match self
            .gateway_call(self.gateway.create_refund(&order.payment_result.id, amount))
            .await
        {
            Ok(receipt) => receipt,
            Err(EngineError::Payment(msg)) => return Err(EngineError::Refund(msg)),
            Err(err) => return Err(err),
        };

        // 4. Apply, restock, persist. The money has already moved, so any
        //    store failure past this point is logged with the refund id
        //    before it propagates.
        order.is_refunded = true;
        order.refunded_at = Some(Utc::now());
        order.status = OrderStatus::Refunded;
        order.refund_result = Some(RefundResult {
            id: receipt.id.clone(),
            status: receipt.status.clone(),
        });

        if let Err(err) = self.restock_items(&order.items).await {
            tracing::error!(
                order_id = %order_id,
                refund_id = %receipt.id,
                error = %err,
                "Restock failed after gateway refund succeeded"
            );
            return Err(err);
        }
        if let Err(err) = self.orders.save(&order).await {
            tracing::error!(
                order_id = %order_id,
                refund_id = %receipt.id,
                error = %err,
                "Order persistence failed after gateway refund succeeded"
            );
            return Err(err.into());
        }
        tracing::info!(order_id = %order_id, refund_id = %receipt.id, "Order refunded");

        // 5. Notify
        self.notify(&order, NotifyKind::RefundConfirmation).await;
        Ok(order)
    }

    /// Fetch a single order, subject to the owner-or-admin gate
    pub async fn get_order(&self, actor: &Actor, order_id: &str) -> EngineResult<Order> {
        let order = self.load_order(order_id).await?;
        authorize(actor, &order)?;
        Ok(order)
    }

    // ==================== Internal helpers ====================

    async fn load_order(&self, order_id: &str) -> EngineResult<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))
    }

    /// Run a gateway call under the configured timeout
    async fn gateway_call<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> EngineResult<T> {
        match tokio::time::timeout(self.config.payment_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(EngineError::Payment(err.to_string())),
            Err(_) => Err(EngineError::GatewayTimeout),
        }
    }

    /// Compensate failed placement: credit every debit back and persist
    ///
    /// Runs while the placement still holds the product locks. Save failures
    /// here are logged rather than propagated, the original gateway error is
    /// the one the caller needs to see.
    async fn restore_debits(&self, input: &OrderCreate, products: &mut HashMap<String, Product>) {
        for item in &input.items {
            if let Some(product) = products.get_mut(&item.product) {
                product.count_in_stock += item.quantity;
            }
        }
        for product in products.values() {
            if let Err(err) = self.products.save(product).await {
                tracing::error!(
                    product_id = ?product.id,
                    error = %err,
                    "Stock rollback failed after payment failure"
                );
            }
        }
    }

    /// Credit the quantities of the given items back to their products
    async fn restock_items(&self, items: &[OrderItem]) -> EngineResult<()> {
        let ids: Vec<&str> = items.iter().map(|i| i.product.as_str()).collect();
        let _guards = self.stock_locks.acquire(&ids).await;

        // Aggregate per product so duplicate line items credit once
        let mut quantities: HashMap<&str, u32> = HashMap::new();
        for item in items {
            *quantities.entry(item.product.as_str()).or_default() += item.quantity;
        }

        for (product_id, quantity) in quantities {
            match self.products.find_by_id(product_id).await? {
                Some(mut product) => {
                    product.count_in_stock += quantity;
                    self.products.save(&product).await?;
                }
                // Product deleted since placement, nothing to credit
                None => {
                    tracing::warn!(product_id = %product_id, "Restock skipped: product no longer exists");
                }
            }
        }
        Ok(())
    }

    /// Send a lifecycle notification, logging instead of failing
    async fn notify(&self, order: &Order, kind: NotifyKind) {
        let Some(user) = self.notification_recipient(order).await else {
            return;
        };
        let result = match kind {
            NotifyKind::Confirmation => self.notifier.send_order_confirmation(order, &user).await,
            NotifyKind::StatusUpdate => self.notifier.send_order_status_update(order, &user).await,
            NotifyKind::RefundConfirmation => {
                self.notifier.send_refund_confirmation(order, &user).await
            }
        };
        if let Err(err) = result {
            tracing::warn!(order_id = ?order.id, error = %err, "Notification delivery failed");
        }
    }

    async fn notification_recipient(&self, order: &Order) -> Option<User> {
        match self.users.find_by_id(&order.user).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::warn!(user_id = %order.user, "Notification skipped: user not found");
                None
            }
            Err(err) => {
                tracing::warn!(user_id = %order.user, error = %err, "Notification skipped: user lookup failed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum NotifyKind {
    Confirmation,
    StatusUpdate,
    RefundConfirmation,
}

/// Owner-or-admin gate applied by every engine operation
fn authorize(actor: &Actor, order: &Order) -> EngineResult<()> {
    if actor.can_access(&order.user) {
        Ok(())
    } else {
        Err(EngineError::Forbidden(
            "Order does not belong to the caller".to_string(),
        ))
    }
}
