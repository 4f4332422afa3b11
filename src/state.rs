use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    services::cart_service::CartService,
    store::{PgCartStore, PgProductCatalog},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub carts: CartService,
}

impl AppState {
    pub fn new(config: AppConfig, pool: DbPool, orm: OrmConn) -> Self {
        let carts = CartService::new(
            Arc::new(PgCartStore::new(orm.clone())),
            Arc::new(PgProductCatalog::new(orm.clone())),
            config.cart,
        );
        Self {
            pool,
            orm,
            config: Arc::new(config),
            carts,
        }
    }
}
