//! Record Store
//!
//! Repository traits over the persistence layer. The engine only sees these
//! traits; the concrete backend is injected at construction time.
//! [`MemoryStore`] provides an in-process implementation used by tests and
//! embedded deployments.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use shared::models::{Order, Product, ProductCreate, User};
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entity has no id, save requires a persisted entity")]
    MissingId,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort direction for listings (by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// Pagination and sorting for list queries
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub sort: SortOrder,
}

impl ListQuery {
    /// Apply skip/limit to an already-sorted sequence
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Product persistence
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>>;
    async fn find_all(&self, query: ListQuery) -> StoreResult<Vec<Product>>;
    async fn count(&self) -> StoreResult<usize>;
    async fn create(&self, data: ProductCreate) -> StoreResult<Product>;
    async fn save(&self, product: &Product) -> StoreResult<()>;
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Order persistence
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn find_by_user(&self, user_id: &str, query: ListQuery) -> StoreResult<Vec<Order>>;
    async fn find_all(&self, query: ListQuery) -> StoreResult<Vec<Order>>;
    async fn count_by_user(&self, user_id: &str) -> StoreResult<usize>;
    async fn create(&self, order: Order) -> StoreResult<Order>;
    async fn save(&self, order: &Order) -> StoreResult<()>;
}

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn create(&self, user: User) -> StoreResult<User>;
    async fn save(&self, user: &User) -> StoreResult<()>;
}
