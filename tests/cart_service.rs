use std::{sync::Arc, time::Duration};

use axum_cart_api::{
    config::CartSettings,
    models::CartItemError,
    services::{
        cart_service::{CartError, CartService},
        pricing::PricingError,
    },
    store::{CartStore, MemoryCartStore, MemoryCatalog, StoreError},
};
use rust_decimal::Decimal;
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryCartStore>,
    catalog: Arc<MemoryCatalog>,
    service: CartService,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryCartStore::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let service = CartService::new(
        store.clone(),
        catalog.clone(),
        CartSettings {
            max_attempts: 3,
            catalog_timeout: Duration::from_secs(2),
        },
    );
    Harness {
        store,
        catalog,
        service,
    }
}

fn dec(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

#[tokio::test]
async fn get_creates_one_empty_cart_per_user() {
    let h = harness();
    let user = Uuid::new_v4();

    let first = h.service.get(user).await.unwrap();
    let second = h.service.get(user).await.unwrap();

    assert_eq!(first.cart.id(), second.cart.id());
    assert!(first.cart.is_empty());
    assert_eq!(first.cart.total_price(), Decimal::ZERO);
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn sample_product_walkthrough() {
    let h = harness();
    let user = Uuid::new_v4();
    let sp001 = h.catalog.add_product("SP001", dec(100)).await;

    let cart = h.service.add(user, sp001.id, 2).await.unwrap();
    assert_eq!(cart.total_price(), dec(200));

    let cart = h.service.update(user, sp001.id, 3).await.unwrap();
    assert_eq!(cart.total_price(), dec(300));

    let cart = h.service.remove(user, sp001.id).await.unwrap();
    assert!(cart.items().is_empty());
    assert_eq!(cart.total_price(), Decimal::ZERO);
}

#[tokio::test]
async fn adding_the_same_product_merges_quantities() {
    let h = harness();
    let user = Uuid::new_v4();
    let mug = h.catalog.add_product("MUG-01", Decimal::new(1999, 2)).await;

    h.service.add(user, mug.id, 2).await.unwrap();
    let cart = h.service.add(user, mug.id, 3).await.unwrap();

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.item(mug.id).map(|i| i.quantity), Some(5));
    assert_eq!(cart.total_price(), Decimal::new(9995, 2));
}

#[tokio::test]
async fn zero_quantity_is_rejected_on_add() {
    let h = harness();
    let product = h.catalog.add_product("SKU-1", dec(5)).await;

    let err = h.service.add(Uuid::new_v4(), product.id, 0).await.unwrap_err();

    assert!(matches!(err, CartError::Item(CartItemError::QuantityTooSmall)));
    assert_eq!(h.store.len().await, 0);
}

#[tokio::test]
async fn update_below_one_removes_the_item() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(10)).await;
    let b = h.catalog.add_product("SKU-B", dec(7)).await;
    h.service.add(user, a.id, 1).await.unwrap();
    h.service.add(user, b.id, 2).await.unwrap();

    let cart = h.service.update(user, a.id, -3).await.unwrap();

    assert!(cart.item(a.id).is_none());
    assert_eq!(cart.total_price(), dec(14));
}

#[tokio::test]
async fn update_of_missing_item_leaves_cart_untouched() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(10)).await;
    let before = h.service.add(user, a.id, 1).await.unwrap();

    let err = h.service.update(user, Uuid::new_v4(), 4).await.unwrap_err();
    assert!(matches!(err, CartError::Item(CartItemError::ItemNotFound)));

    let after = h.store.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(after.version(), before.version());
    assert_eq!(after.items(), before.items());
}

#[tokio::test]
async fn operations_on_a_missing_cart_report_not_found() {
    let h = harness();
    let user = Uuid::new_v4();

    assert!(matches!(
        h.service.update(user, Uuid::new_v4(), 1).await,
        Err(CartError::CartNotFound)
    ));
    assert!(matches!(
        h.service.remove(user, Uuid::new_v4()).await,
        Err(CartError::CartNotFound)
    ));
    assert!(matches!(h.service.clear(user).await, Err(CartError::CartNotFound)));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn removing_an_absent_item_is_not_an_error() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(3)).await;
    h.service.add(user, a.id, 3).await.unwrap();

    let cart = h.service.remove(user, Uuid::new_v4()).await.unwrap();

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.total_price(), dec(9));
}

#[tokio::test]
async fn clearing_twice_keeps_an_empty_cart() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(3)).await;
    h.service.add(user, a.id, 1).await.unwrap();

    let first = h.service.clear(user).await.unwrap();
    let second = h.service.clear(user).await.unwrap();

    assert!(first.is_empty());
    assert!(second.is_empty());
    assert_eq!(second.total_price(), Decimal::ZERO);
    assert_eq!(second.id(), first.id());
}

#[tokio::test]
async fn price_changes_apply_on_the_next_mutation_only() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(100)).await;
    let b = h.catalog.add_product("SKU-B", dec(1)).await;
    h.service.add(user, a.id, 2).await.unwrap();

    h.catalog.set_price(a.id, dec(150)).await;

    let snapshot = h.service.get(user).await.unwrap();
    assert_eq!(snapshot.cart.total_price(), dec(200));
    assert_eq!(snapshot.product(a.id).map(|p| p.price), Some(dec(150)));

    let cart = h.service.add(user, b.id, 1).await.unwrap();
    assert_eq!(cart.total_price(), dec(301));
}

#[tokio::test]
async fn inactive_products_price_at_zero_and_are_not_resolved() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(40)).await;
    let b = h.catalog.add_product("SKU-B", dec(2)).await;
    h.service.add(user, a.id, 1).await.unwrap();
    h.service.add(user, b.id, 1).await.unwrap();

    h.catalog.deactivate(a.id).await;
    let cart = h.service.update(user, b.id, 5).await.unwrap();
    assert_eq!(cart.total_price(), dec(10));
    assert!(cart.item(a.id).is_some());

    let details = h.service.get(user).await.unwrap();
    assert!(details.product(a.id).is_none());
    assert!(details.product(b.id).is_some());
}

#[tokio::test]
async fn deleted_products_price_at_zero() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(25)).await;
    let b = h.catalog.add_product("SKU-B", dec(3)).await;
    h.service.add(user, a.id, 2).await.unwrap();
    h.service.add(user, b.id, 1).await.unwrap();

    h.catalog.delete(a.id).await;
    let cart = h.service.remove(user, b.id).await.unwrap();
    assert_eq!(cart.total_price(), Decimal::ZERO);
    assert_eq!(cart.item(a.id).map(|i| i.quantity), Some(2));

    let details = h.service.get(user).await.unwrap();
    assert!(details.product(a.id).is_none());
}

#[tokio::test]
async fn catalog_failure_aborts_the_mutation() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(10)).await;
    let before = h.service.add(user, a.id, 1).await.unwrap();

    h.catalog.set_fail_lookups(true).await;
    let err = h.service.add(user, a.id, 4).await.unwrap_err();
    assert!(matches!(
        err,
        CartError::Pricing(PricingError::Store(StoreError::Unavailable(_)))
    ));

    let after = h.store.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(after.item(a.id).map(|i| i.quantity), Some(1));
    assert_eq!(after.total_price(), before.total_price());
    assert_eq!(after.version(), before.version());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_lose_no_updates() {
    let h = harness();
    let user = Uuid::new_v4();
    let a = h.catalog.add_product("SKU-A", dec(3)).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let service = h.service.clone();
            let product = a.id;
            tokio::spawn(async move { service.add(user, product, 1).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cart = h.store.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(cart.item(a.id).map(|i| i.quantity), Some(20));
    assert_eq!(cart.total_price(), dec(60));
    assert_eq!(cart.version(), 20);
}
