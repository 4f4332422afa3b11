use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;

use crate::{
    models::{Cart, CartItem},
    store::{ProductCatalog, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Catalog lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog lookup exceeded {0:?}")]
    Timeout(Duration),

    #[error("Cart total overflowed")]
    Overflow,
}

/// A total computed against the catalog. Opaque outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedTotal(Decimal);

impl PricedTotal {
    pub fn amount(self) -> Decimal {
        self.0
    }
}

#[derive(Clone)]
pub struct PricingEngine {
    catalog: Arc<dyn ProductCatalog>,
    timeout: Duration,
}

impl PricingEngine {
    pub fn new(catalog: Arc<dyn ProductCatalog>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    pub async fn total_for(&self, items: &[CartItem]) -> Result<PricedTotal, PricingError> {
        tokio::time::timeout(self.timeout, self.sum(items))
            .await
            .map_err(|_| PricingError::Timeout(self.timeout))?
    }

    pub async fn reprice(&self, cart: &mut Cart) -> Result<PricedTotal, PricingError> {
        let total = self.total_for(cart.items()).await?;
        cart.apply_total(total);
        Ok(total)
    }

    async fn sum(&self, items: &[CartItem]) -> Result<PricedTotal, PricingError> {
        let mut total = Decimal::ZERO;
        for item in items {
            let Some(product) = self.catalog.find_product_by_id(item.product).await? else {
                tracing::debug!(product_id = %item.product, "product not in catalog, priced at zero");
                continue;
            };
            let line = product
                .price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or(PricingError::Overflow)?;
            total = total.checked_add(line).ok_or(PricingError::Overflow)?;
        }
        Ok(PricedTotal(total))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{models::Product, store::MemoryCatalog};

    fn engine(catalog: Arc<MemoryCatalog>) -> PricingEngine {
        PricingEngine::new(catalog, Duration::from_secs(1))
    }

    fn item(product: Uuid, quantity: u32) -> CartItem {
        CartItem { product, quantity }
    }

    #[tokio::test]
    async fn sums_price_times_quantity() {
        let catalog = Arc::new(MemoryCatalog::new());
        let mug = catalog.add_product("MUG", Decimal::new(1250, 2)).await;
        let tee = catalog.add_product("TEE", Decimal::new(20, 0)).await;

        let total = engine(catalog)
            .total_for(&[item(mug.id, 2), item(tee.id, 3)])
            .await
            .unwrap();

        assert_eq!(total.amount(), Decimal::new(8500, 2));
    }

    #[tokio::test]
    async fn empty_cart_costs_nothing() {
        let catalog = Arc::new(MemoryCatalog::new());
        let total = engine(catalog.clone()).total_for(&[]).await.unwrap();

        assert_eq!(total.amount(), Decimal::ZERO);
        assert_eq!(catalog.lookup_count().await, 0);
    }

    #[tokio::test]
    async fn missing_and_inactive_products_count_as_zero() {
        let catalog = Arc::new(MemoryCatalog::new());
        let kept = catalog.add_product("KEEP", Decimal::new(10, 0)).await;
        let retired = catalog.add_product("OLD", Decimal::new(99, 0)).await;
        catalog.deactivate(retired.id).await;

        let total = engine(catalog)
            .total_for(&[item(kept.id, 1), item(retired.id, 4), item(Uuid::new_v4(), 7)])
            .await
            .unwrap();

        assert_eq!(total.amount(), Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn catalog_failure_aborts() {
        let catalog = Arc::new(MemoryCatalog::new());
        let product = catalog.add_product("SP001", Decimal::new(100, 0)).await;
        catalog.set_fail_lookups(true).await;

        let result = engine(catalog).total_for(&[item(product.id, 1)]).await;

        assert!(matches!(result, Err(PricingError::Store(_))));
    }

    #[tokio::test]
    async fn overflow_is_an_error() {
        let catalog = Arc::new(MemoryCatalog::new());
        let product = catalog.add_product("BIG", Decimal::MAX).await;

        let result = engine(catalog).total_for(&[item(product.id, 2)]).await;

        assert!(matches!(result, Err(PricingError::Overflow)));
    }

    struct StalledCatalog;

    #[async_trait]
    impl ProductCatalog for StalledCatalog {
        async fn find_product_by_id(&self, _id: Uuid) -> crate::store::Result<Option<Product>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn find_products_by_ids(&self, _ids: &[Uuid]) -> crate::store::Result<Vec<Product>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_catalog_times_out() {
        let engine = PricingEngine::new(Arc::new(StalledCatalog), Duration::from_millis(50));

        let result = engine.total_for(&[item(Uuid::new_v4(), 1)]).await;

        assert!(matches!(result, Err(PricingError::Timeout(_))));
    }

    #[tokio::test]
    async fn reprice_writes_total_onto_cart() {
        let catalog = Arc::new(MemoryCatalog::new());
        let product = catalog.add_product("SP001", Decimal::new(100, 0)).await;
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.add_item(product.id, 2).unwrap();

        engine(catalog).reprice(&mut cart).await.unwrap();

        assert_eq!(cart.total_price(), Decimal::new(200, 0));
    }
}
