use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr,
    sea_query::OnConflict,
};
use uuid::Uuid;

use super::{CartStore, ProductCatalog, Result, StoreError};
use crate::{
    db::OrmConn,
    entity::{
        carts::{self, Entity as Carts},
        products::{self, Entity as Products},
    },
    models::{Cart, CartItem, Product},
};

#[derive(Clone)]
pub struct PgCartStore {
    orm: OrmConn,
}

impl PgCartStore {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Cart> {
        if let Some(cart) = self.find_by_user(user_id).await? {
            return Ok(cart);
        }

        let now = db_now().fixed_offset();
        let blank = carts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            items: Set(serde_json::json!([])),
            total_price: Set(Decimal::ZERO),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The unique index on user_id arbitrates concurrent first reads.
        Carts::insert(blank)
            .on_conflict(
                OnConflict::column(carts::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.orm)
            .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or(StoreError::Vanished(user_id))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Cart>> {
        Carts::find()
            .filter(carts::Column::UserId.eq(user_id))
            .one(&self.orm)
            .await?
            .map(cart_from_entity)
            .transpose()
    }

    async fn save(&self, cart: &Cart) -> Result<Cart> {
        let items = serde_json::to_value(cart.items())?;
        let now = db_now();

        let result = Carts::update_many()
            .col_expr(carts::Column::Items, Expr::value(items))
            .col_expr(carts::Column::TotalPrice, Expr::value(cart.total_price()))
            .col_expr(carts::Column::Version, Expr::value(cart.version() + 1))
            .col_expr(carts::Column::UpdatedAt, Expr::value(now.fixed_offset()))
            .filter(carts::Column::Id.eq(cart.id()))
            .filter(carts::Column::Version.eq(cart.version()))
            .exec(&self.orm)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::VersionConflict {
                cart_id: cart.id(),
                expected: cart.version(),
            });
        }

        let mut saved = cart.clone();
        saved.mark_saved(now);
        Ok(saved)
    }
}

#[derive(Clone)]
pub struct PgProductCatalog {
    orm: OrmConn,
}

impl PgProductCatalog {
    pub fn new(orm: OrmConn) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Products::find_by_id(id)
            .filter(products::Column::IsActive.eq(true))
            .one(&self.orm)
            .await?
            .map(product_from_entity)
            .transpose()
    }

    async fn find_products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Products::find()
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .filter(products::Column::IsActive.eq(true))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect()
    }
}

/// Current time at the precision `TIMESTAMPTZ` stores.
fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn cart_from_entity(model: carts::Model) -> Result<Cart> {
    let items: Vec<CartItem> = serde_json::from_value(model.items)?;
    Ok(Cart::restore(
        model.id,
        model.user_id,
        items,
        model.total_price,
        model.version,
        model.created_at.with_timezone(&Utc),
        model.updated_at.with_timezone(&Utc),
    ))
}

pub(crate) fn product_from_entity(model: products::Model) -> Result<Product> {
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        sku: model.sku,
        price: model.price,
        discount: model.discount,
        categories: serde_json::from_value(model.categories)?,
        tags: serde_json::from_value(model.tags)?,
        images: serde_json::from_value(model.images)?,
        stock: model.stock,
        metadata: model.metadata,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
