//! Concurrent placement stress test
//!
//! Many tasks race to buy the same product; the engine must hand out exactly
//! the available stock and reject the rest, never overselling.

use async_trait::async_trait;
use commerce_server::notify::LogNotifier;
use commerce_server::payment::{
    GatewayError, PaymentAuthorization, PaymentGateway, RefundReceipt,
};
use commerce_server::store::{OrderRepository, ProductRepository};
use commerce_server::{Config, EngineError, MemoryStore, OrderEngine};
use rust_decimal::Decimal;
use shared::models::{Actor, OrderCreate, OrderItemInput, ProductCreate, Role, ShippingAddress};
use std::sync::Arc;

struct AlwaysApproveGateway;

#[async_trait]
impl PaymentGateway for AlwaysApproveGateway {
    async fn create_authorization(
        &self,
        amount_minor: i64,
        _currency: &str,
    ) -> Result<PaymentAuthorization, GatewayError> {
        Ok(PaymentAuthorization {
            id: format!("auth_{}", amount_minor),
            client_secret: "secret".to_string(),
            status: "requires_confirmation".to_string(),
        })
    }

    async fn create_refund(
        &self,
        authorization_id: &str,
        _amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError> {
        Ok(RefundReceipt {
            id: format!("re_{}", authorization_id),
            status: "succeeded".to_string(),
        })
    }
}

fn order_for(product_id: &str, quantity: u32) -> OrderCreate {
    let total = Decimal::new(500, 2) * Decimal::from(quantity);
    OrderCreate {
        items: vec![OrderItemInput {
            product: product_id.to_string(),
            quantity,
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
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_placements_never_oversell() {
    let store = Arc::new(MemoryStore::new());
    let product = ProductRepository::create(
        &*store,
        ProductCreate {
            name: "Hot Item".to_string(),
            price: Decimal::new(500, 2),
            count_in_stock: 50,
        },
    )
    .await
    .unwrap();
    let product_id = product.id.unwrap();

    let engine = Arc::new(OrderEngine::with_store(
        store.clone(),
        Arc::new(AlwaysApproveGateway),
        Arc::new(LogNotifier),
        Config::with_overrides("usd", 1_000),
    ));

    // 20 buyers of 5 units each want 100 units; only 50 exist
    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = engine.clone();
        let product_id = product_id.clone();
        handles.push(tokio::spawn(async move {
            let actor = Actor {
                user_id: format!("buyer-{}", i),
                role: Role::Customer,
            };
            engine.place_order(&actor, order_for(&product_id, 5)).await
        }));
    }

    let mut succeeded = 0u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(EngineError::InsufficientStock(id)) => assert_eq!(id, product_id),
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(succeeded, 10, "exactly the available stock is sold");

    let product = ProductRepository::find_by_id(&*store, &product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.count_in_stock, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_cancel_and_place_balance_out() {
    let store = Arc::new(MemoryStore::new());
    let product = ProductRepository::create(
        &*store,
        ProductCreate {
            name: "Gadget".to_string(),
            price: Decimal::new(500, 2),
            count_in_stock: 30,
        },
    )
    .await
    .unwrap();
    let product_id = product.id.unwrap();

    let engine = Arc::new(OrderEngine::with_store(
        store.clone(),
        Arc::new(AlwaysApproveGateway),
        Arc::new(LogNotifier),
        Config::with_overrides("usd", 1_000),
    ));

    // Seed 10 placed orders of 2 units each, stock drops to 10
    let mut order_ids = Vec::new();
    for i in 0..10 {
        let actor = Actor {
            user_id: format!("seed-{}", i),
            role: Role::Customer,
        };
        let placed = engine
            .place_order(&actor, order_for(&product_id, 2))
            .await
            .unwrap();
        order_ids.push((actor, placed.order.id.unwrap()));
    }

    // Cancel all ten while ten new buyers place orders of 2
    let mut handles = Vec::new();
    for (actor, order_id) in order_ids {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.cancel_order(&actor, &order_id).await.map(|_| 0u32)
        }));
    }
    for i in 0..10 {
        let engine = engine.clone();
        let product_id = product_id.clone();
        handles.push(tokio::spawn(async move {
            let actor = Actor {
                user_id: format!("late-{}", i),
                role: Role::Customer,
            };
            engine
                .place_order(&actor, order_for(&product_id, 2))
                .await
                .map(|_| 2u32)
        }));
    }

    let mut placed_units = 0u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(units) => placed_units += units,
            // A late buyer can lose the race against pending cancels
            Err(EngineError::InsufficientStock(_)) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    // Conservation: credits and debits reconcile exactly
    let product = ProductRepository::find_by_id(&*store, &product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.count_in_stock, 30 - placed_units);

    let open_orders = OrderRepository::find_all(&*store, Default::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|o| o.status == shared::models::OrderStatus::Placed)
        .count() as u32;
    assert_eq!(open_orders * 2, placed_units);
}
