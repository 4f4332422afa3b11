use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Cart, Product};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryCartStore, MemoryCatalog};
pub use postgres::{PgCartStore, PgProductCatalog};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cart {cart_id} was modified concurrently (expected version {expected})")]
    VersionConflict { cart_id: Uuid, expected: i64 },

    #[error("Cart for user {0} vanished after creation")]
    Vanished(Uuid),

    #[error("Cart {0} was never persisted")]
    UnknownCart(Uuid),

    #[error("Malformed cart items: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("ORM error: {0}")]
    Orm(#[from] sea_orm::DbErr),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Cart>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Cart>>;

    async fn save(&self, cart: &Cart) -> Result<Cart>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<Product>>;

    async fn find_products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
}
