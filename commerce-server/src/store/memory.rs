//! In-memory record store
//!
//! Backend-free implementation of the repository traits. Used by the test
//! suites and by embedded deployments that do not need durability.

use super::{ListQuery, OrderRepository, ProductRepository, SortOrder, StoreResult};
use super::{StoreError, UserRepository};
use async_trait::async_trait;
use shared::models::{Order, Product, ProductCreate, User};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory store implementing all repository traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<String, Product>>,
    orders: RwLock<HashMap<String, Order>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn find_all(&self, query: ListQuery) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        if query.sort == SortOrder::Newest {
            products.reverse();
        }
        Ok(query.paginate(products))
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.products.read().await.len())
    }

    async fn create(&self, data: ProductCreate) -> StoreResult<Product> {
        let product = Product {
            id: Some(Self::next_id()),
            name: data.name,
            price: data.price,
            count_in_stock: data.count_in_stock,
            rating: 0.0,
            reviews: Vec::new(),
        };
        let id = product.id.clone().ok_or(StoreError::MissingId)?;
        self.products.write().await.insert(id, product.clone());
        Ok(product)
    }

    async fn save(&self, product: &Product) -> StoreResult<()> {
        let id = product.id.clone().ok_or(StoreError::MissingId)?;
        self.products.write().await.insert(id, product.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.products.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_user(&self, user_id: &str, query: ListQuery) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.user == user_id)
            .cloned()
            .collect();
        sort_orders(&mut orders, query.sort);
        Ok(query.paginate(orders))
    }

    async fn find_all(&self, query: ListQuery) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        sort_orders(&mut orders, query.sort);
        Ok(query.paginate(orders))
    }

    async fn count_by_user(&self, user_id: &str) -> StoreResult<usize> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.user == user_id)
            .count())
    }

    async fn create(&self, mut order: Order) -> StoreResult<Order> {
        if order.id.is_none() {
            order.id = Some(Self::next_id());
        }
        let id = order.id.clone().ok_or(StoreError::MissingId)?;
        self.orders.write().await.insert(id, order.clone());
        Ok(order)
    }

    async fn save(&self, order: &Order) -> StoreResult<()> {
        let id = order.id.clone().ok_or(StoreError::MissingId)?;
        self.orders.write().await.insert(id, order.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, mut user: User) -> StoreResult<User> {
        if user.id.is_none() {
            user.id = Some(Self::next_id());
        }
        let id = user.id.clone().ok_or(StoreError::MissingId)?;
        self.users.write().await.insert(id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> StoreResult<()> {
        let id = user.id.clone().ok_or(StoreError::MissingId)?;
        self.users.write().await.insert(id, user.clone());
        Ok(())
    }
}

fn sort_orders(orders: &mut [Order], sort: SortOrder) {
    orders.sort_by_key(|o| o.created_at);
    if sort == SortOrder::Newest {
        orders.reverse();
    }
}
