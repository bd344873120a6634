//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Placed,
    Shipped,
    Delivered,
    Canceled,
    Refunded,
}

/// Order line item
///
/// Name and price are snapshotted at placement time and stay independent
/// of later product edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product reference (String ID)
    pub product: String,
    pub name: String,
    /// Quantity ordered (positive)
    pub quantity: u32,
    /// Unit price in currency units at time of order
    pub price: Decimal,
}

/// Shipping address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Payment gateway authorization state attached to an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Gateway authorization id
    pub id: String,
    pub status: String,
    pub update_time: Option<DateTime<Utc>>,
    pub payer_email: Option<String>,
}

/// Payment gateway refund state attached to an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResult {
    /// Gateway refund id
    pub id: String,
    pub status: String,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    /// Owning user reference (String ID)
    pub user: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    /// Price fields in currency units, supplied by the caller
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub is_refunded: bool,
    pub refunded_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub payment_result: PaymentResult,
    pub refund_result: Option<RefundResult>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Requested line item for order placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    /// Product reference (String ID)
    pub product: String,
    pub quantity: u32,
}

/// Place order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    /// Price fields in currency units, precomputed by the caller
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
}

/// Payment confirmation payload from the gateway's callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Gateway authorization id
    pub id: String,
    pub status: String,
    pub update_time: Option<DateTime<Utc>>,
    pub payer_email: Option<String>,
}
