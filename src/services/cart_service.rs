use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    config::CartSettings,
    models::{Cart, CartItemError, Product},
    services::pricing::{PricingEngine, PricingError},
    store::{CartStore, ProductCatalog, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Cart not found")]
    CartNotFound,

    #[error(transparent)]
    Item(#[from] CartItemError),

    #[error("Cart was modified concurrently, retry the request")]
    Conflict { attempts: u32 },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct CartDetails {
    pub cart: Cart,
    pub products: Vec<Product>,
}

impl CartDetails {
    pub fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

#[derive(Clone, Copy)]
enum Load {
    GetOrCreate,
    Existing,
}

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
    pricing: PricingEngine,
    locks: Arc<CartLocks>,
    max_attempts: u32,
}

impl CartService {
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        settings: CartSettings,
    ) -> Self {
        let pricing = PricingEngine::new(catalog.clone(), settings.catalog_timeout);
        Self {
            store,
            catalog,
            pricing,
            locks: Arc::new(CartLocks::default()),
            max_attempts: settings.max_attempts.max(1),
        }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<CartDetails, CartError> {
        let cart = self.store.get_or_create(user_id).await?;
        let products = self.catalog.find_products_by_ids(&cart.product_ids()).await?;
        Ok(CartDetails { cart, products })
    }

    pub async fn add(&self, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartItemError::QuantityTooSmall.into());
        }
        let cart = self
            .mutate(user_id, Load::GetOrCreate, |cart| {
                cart.add_item(product_id, quantity).map_err(CartError::from)
            })
            .await?;
        tracing::debug!(%user_id, %product_id, quantity, total = %cart.total_price(), "item added to cart");
        Ok(cart)
    }

    pub async fn update(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<Cart, CartError> {
        let cart = self
            .mutate(user_id, Load::Existing, |cart| {
                cart.set_quantity(product_id, quantity).map_err(CartError::from)
            })
            .await?;
        tracing::debug!(%user_id, %product_id, quantity, total = %cart.total_price(), "cart item updated");
        Ok(cart)
    }

    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<Cart, CartError> {
        let cart = self
            .mutate(user_id, Load::Existing, |cart| {
                cart.remove_item(product_id);
                Ok(())
            })
            .await?;
        tracing::debug!(%user_id, %product_id, items = cart.items().len(), "cart item removed");
        Ok(cart)
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<Cart, CartError> {
        let cart = self
            .mutate(user_id, Load::Existing, |cart| {
                cart.clear();
                Ok(())
            })
            .await?;
        tracing::debug!(%user_id, "cart cleared");
        Ok(cart)
    }

    async fn mutate<F>(&self, user_id: Uuid, load: Load, mut apply: F) -> Result<Cart, CartError>
    where
        F: FnMut(&mut Cart) -> Result<(), CartError>,
    {
        let guard = self.locks.acquire(user_id).await;
        let result = self.mutate_locked(user_id, load, &mut apply).await;
        drop(guard);
        self.locks.prune();
        result
    }

    async fn mutate_locked<F>(&self, user_id: Uuid, load: Load, apply: &mut F) -> Result<Cart, CartError>
    where
        F: FnMut(&mut Cart) -> Result<(), CartError>,
    {
        for attempt in 1..=self.max_attempts {
            let mut cart = match load {
                Load::GetOrCreate => self.store.get_or_create(user_id).await?,
                Load::Existing => self
                    .store
                    .find_by_user(user_id)
                    .await?
                    .ok_or(CartError::CartNotFound)?,
            };

            apply(&mut cart)?;
            self.pricing.reprice(&mut cart).await?;

            match self.store.save(&cart).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::VersionConflict { cart_id, expected }) => {
                    tracing::warn!(%user_id, %cart_id, expected, attempt, "cart version conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(CartError::Conflict {
            attempts: self.max_attempts,
        })
    }
}

#[derive(Default)]
struct CartLocks {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl CartLocks {
    async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(user_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    fn prune(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
