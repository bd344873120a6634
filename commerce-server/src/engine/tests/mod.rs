use super::*;
use crate::notify::{Notifier, NotifyError};
use crate::payment::{PaymentAuthorization, PaymentGateway, RefundReceipt};
use crate::store::MemoryStore;
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{OrderItemInput, Role, ShippingAddress};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ========================================================================
// Gateway double
// ========================================================================

/// Scriptable in-memory gateway
#[derive(Debug, Default)]
struct MockGateway {
    decline_authorizations: AtomicBool,
    decline_refunds: AtomicBool,
    delay: Option<Duration>,
    authorizations: AtomicUsize,
    refunds: AtomicUsize,
}

impl MockGateway {
    fn declining() -> Self {
        let gateway = Self::default();
        gateway.decline_authorizations.store(true, Ordering::SeqCst);
        gateway
    }

    fn refund_declining() -> Self {
        let gateway = Self::default();
        gateway.decline_refunds.store(true, Ordering::SeqCst);
        gateway
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn authorization_count(&self) -> usize {
        self.authorizations.load(Ordering::SeqCst)
    }

    fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_authorization(
        &self,
        amount_minor: i64,
        _currency: &str,
    ) -> Result<PaymentAuthorization, GatewayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.decline_authorizations.load(Ordering::SeqCst) {
            return Err(GatewayError::Declined("card declined".to_string()));
        }
        let n = self.authorizations.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentAuthorization {
            id: format!("auth_{}", n),
            client_secret: format!("secret_{}_{}", n, amount_minor),
            status: "requires_confirmation".to_string(),
        })
    }

    async fn create_refund(
        &self,
        authorization_id: &str,
        _amount_minor: i64,
    ) -> Result<RefundReceipt, GatewayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.decline_refunds.load(Ordering::SeqCst) {
            return Err(GatewayError::Declined("refund rejected".to_string()));
        }
        let n = self.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(RefundReceipt {
            id: format!("re_{}_{}", authorization_id, n),
            status: "succeeded".to_string(),
        })
    }
}

// ========================================================================
// Notifier double
// ========================================================================

/// Notifier that records what was sent, optionally failing every send
#[derive(Debug, Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<&'static str>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    fn record(&self, kind: &'static str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("smtp unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(kind);
        Ok(())
    }

    fn sent(&self) -> Vec<&'static str> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_order_confirmation(
        &self,
        _order: &Order,
        _user: &User,
    ) -> Result<(), NotifyError> {
        self.record("confirmation")
    }

    async fn send_order_status_update(
        &self,
        _order: &Order,
        _user: &User,
    ) -> Result<(), NotifyError> {
        self.record("status_update")
    }

    async fn send_refund_confirmation(
        &self,
        _order: &Order,
        _user: &User,
    ) -> Result<(), NotifyError> {
        self.record("refund_confirmation")
    }
}

// ========================================================================
// Engine fixture
// ========================================================================

struct TestContext {
    engine: OrderEngine,
    store: Arc<MemoryStore>,
    gateway: Arc<MockGateway>,
    notifier: Arc<RecordingNotifier>,
}

fn create_test_engine() -> TestContext {
    create_test_engine_with(MockGateway::default(), RecordingNotifier::default())
}

fn create_test_engine_with(gateway: MockGateway, notifier: RecordingNotifier) -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(notifier);
    let engine = OrderEngine::with_store(
        store.clone(),
        gateway.clone(),
        notifier.clone(),
        Config::with_overrides("usd", 200),
    );
    TestContext {
        engine,
        store,
        gateway,
        notifier,
    }
}

// ========================================================================
// Seed helpers
// ========================================================================

async fn seed_product(store: &MemoryStore, name: &str, price_cents: i64, stock: u32) -> String {
    let product = ProductRepository::create(
        store,
        shared::models::ProductCreate {
            name: name.to_string(),
            price: Decimal::new(price_cents, 2),
            count_in_stock: stock,
        },
    )
    .await
    .unwrap();
    product.id.unwrap()
}

async fn seed_customer(store: &MemoryStore, name: &str) -> Actor {
    let user = UserRepository::create(
        store,
        User {
            id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name),
            role: Role::Customer,
        },
    )
    .await
    .unwrap();
    Actor {
        user_id: user.id.unwrap(),
        role: Role::Customer,
    }
}

fn admin_actor() -> Actor {
    Actor {
        user_id: "admin-1".to_string(),
        role: Role::Admin,
    }
}

fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
        country: "US".to_string(),
    }
}

/// Placement payload for the given (product, quantity) pairs
fn order_input(items: &[(&str, u32)], total_cents: i64) -> OrderCreate {
    let total = Decimal::new(total_cents, 2);
    OrderCreate {
        items: items
            .iter()
            .map(|(product, quantity)| OrderItemInput {
                product: product.to_string(),
                quantity: *quantity,
            })
            .collect(),
        shipping_address: shipping_address(),
        payment_method: "card".to_string(),
        items_price: total,
        tax_price: Decimal::ZERO,
        shipping_price: Decimal::ZERO,
        total_price: total,
    }
}

fn payment_confirmation(authorization_id: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        id: authorization_id.to_string(),
        status: "COMPLETED".to_string(),
        update_time: Some(Utc::now()),
        payer_email: Some("payer@example.com".to_string()),
    }
}

/// Place an order and unwrap, asserting success
async fn place_ok(
    ctx: &TestContext,
    actor: &Actor,
    items: &[(&str, u32)],
    total_cents: i64,
) -> PlacedOrder {
    ctx.engine
        .place_order(actor, order_input(items, total_cents))
        .await
        .expect("placement should succeed")
}

/// Place an order and drive it to paid
async fn place_paid(
    ctx: &TestContext,
    actor: &Actor,
    items: &[(&str, u32)],
    total_cents: i64,
) -> Order {
    let placed = place_ok(ctx, actor, items, total_cents).await;
    let order_id = placed.order.id.clone().unwrap();
    ctx.engine
        .mark_paid(
            actor,
            &order_id,
            payment_confirmation(&placed.order.payment_result.id),
        )
        .await
        .expect("mark_paid should succeed")
}

async fn stock_of(store: &MemoryStore, product_id: &str) -> u32 {
    ProductRepository::find_by_id(store, product_id)
        .await
        .unwrap()
        .unwrap()
        .count_in_stock
}

async fn stored_order(store: &MemoryStore, order_id: &str) -> Order {
    OrderRepository::find_by_id(store, order_id)
        .await
        .unwrap()
        .unwrap()
}
