use commerce_server::notify::LogNotifier;
use commerce_server::payment::SandboxGateway;
use commerce_server::store::{ProductRepository, UserRepository};
use commerce_server::utils::logger::init_logger_with_level;
use commerce_server::{Config, MemoryStore, OrderEngine};
use rust_decimal::Decimal;
use shared::models::{
    Actor, OrderCreate, OrderItemInput, PaymentConfirmation, ProductCreate, Role,
    ShippingAddress, User,
};
use std::sync::Arc;

/// Runs one order through its full lifecycle against the embedded stack
/// (in-memory store, sandbox gateway, log notifier).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration and logging
    let config = Config::from_env();
    init_logger_with_level(Some(&config.log_level));
    tracing::info!("Commerce server starting...");

    // 2. Wire the engine with the embedded collaborators
    let store = Arc::new(MemoryStore::new());
    let engine = OrderEngine::with_store(
        store.clone(),
        Arc::new(SandboxGateway),
        Arc::new(LogNotifier),
        config,
    );

    // 3. Seed a demo catalog and customer
    let product = ProductRepository::create(
        &*store,
        ProductCreate {
            name: "Mechanical Keyboard".to_string(),
            price: Decimal::new(8999, 2),
            count_in_stock: 25,
        },
    )
    .await?;
    let product_id = product.id.ok_or("product id missing after create")?;

    let customer = UserRepository::create(
        &*store,
        User {
            id: None,
            name: "Demo Customer".to_string(),
            email: "demo@example.com".to_string(),
            role: Role::Customer,
        },
    )
    .await?;
    let actor = Actor {
        user_id: customer.id.ok_or("user id missing after create")?,
        role: Role::Customer,
    };

    // 4. Place, pay, deliver
    let total = Decimal::new(17998, 2);
    let placed = engine
        .place_order(
            &actor,
            OrderCreate {
                items: vec![OrderItemInput {
                    product: product_id,
                    quantity: 2,
                }],
                shipping_address: ShippingAddress {
                    address: "1 Main St".to_string(),
                    city: "Springfield".to_string(),
                    postal_code: "12345".to_string(),
                    country: "US".to_string(),
                },
                payment_method: "card".to_string(),
                items_price: total,
                tax_price: Decimal::ZERO,
                shipping_price: Decimal::ZERO,
                total_price: total,
            },
        )
        .await?;
    let order_id = placed.order.id.clone().ok_or("order id missing")?;
    tracing::info!(order_id = %order_id, client_secret = %placed.client_secret, "Order placed");

    engine
        .mark_paid(
            &actor,
            &order_id,
            PaymentConfirmation {
                id: placed.order.payment_result.id.clone(),
                status: "COMPLETED".to_string(),
                update_time: Some(chrono::Utc::now()),
                payer_email: Some(customer.email.clone()),
            },
        )
        .await?;
    engine.mark_delivered(&actor, &order_id).await?;

    // 5. Refund and report final state
    let order = engine.refund_order(&actor, &order_id).await?;
    tracing::info!(
        order_id = %order_id,
        status = ?order.status,
        refund_id = ?order.refund_result.as_ref().map(|r| r.id.as_str()),
        "Lifecycle complete"
    );

    Ok(())
}
