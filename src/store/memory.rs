use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartStore, ProductCatalog, Result, StoreError};
use crate::models::{Cart, Product};

#[derive(Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<Uuid, Cart>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.carts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.carts.read().await.is_empty()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let cart = carts
            .entry(user_id)
            .or_insert_with(|| Cart::empty(user_id));
        Ok(cart.clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        let stored = carts
            .get_mut(&cart.user_id())
            .filter(|stored| stored.id() == cart.id())
            .ok_or(StoreError::UnknownCart(cart.id()))?;

        if stored.version() != cart.version() {
            return Err(StoreError::VersionConflict {
                cart_id: cart.id(),
                expected: cart.version(),
            });
        }

        let mut saved = cart.clone();
        saved.mark_saved(Utc::now());
        *stored = saved.clone();
        Ok(saved)
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
    fail_lookups: RwLock<bool>,
    lookups: RwLock<usize>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn add_product(&self, sku: &str, price: Decimal) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: format!("Product {sku}"),
            description: format!("Catalog entry for {sku}"),
            sku: sku.to_string(),
            price,
            discount: Decimal::ZERO,
            categories: Vec::new(),
            tags: Vec::new(),
            images: Vec::new(),
            stock: 50,
            metadata: serde_json::json!({}),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.upsert(product.clone()).await;
        product
    }

    pub async fn set_price(&self, id: Uuid, price: Decimal) {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.price = price;
            product.updated_at = Utc::now();
        }
    }

    pub async fn deactivate(&self, id: Uuid) {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.is_active = false;
        }
    }

    pub async fn delete(&self, id: Uuid) {
        self.products.write().await.remove(&id);
    }

    pub async fn set_fail_lookups(&self, fail: bool) {
        *self.fail_lookups.write().await = fail;
    }

    pub async fn lookup_count(&self) -> usize {
        *self.lookups.read().await
    }

    async fn check_available(&self) -> Result<()> {
        if *self.fail_lookups.read().await {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        self.check_available().await?;
        *self.lookups.write().await += 1;
        let products = self.products.read().await;
        Ok(products.get(&id).filter(|p| p.is_active).cloned())
    }

    async fn find_products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        self.check_available().await?;
        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id))
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }
}
