use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::users, services::pricing::PricedTotal};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub sku: String,
    pub price: Decimal,
    /// Percentage shown to shoppers; cart totals use `price`.
    pub discount: Decimal,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub stock: i32,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line inside a cart. Never has a quantity below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartItemError {
    #[error("Quantity must be at least 1")]
    QuantityTooSmall,
    #[error("Quantity must not exceed {max}")]
    QuantityTooLarge { max: u32 },
    #[error("Item not found in cart")]
    ItemNotFound,
}

/// A user's cart.
///
/// `total_price` is a snapshot taken by the pricing engine at the last
/// mutation; it is not kept in sync with later catalog price changes.
/// Item mutations leave the total stale until [`Cart::apply_total`] is called
/// with a freshly computed [`PricedTotal`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    items: Vec<CartItem>,
    total_price: Decimal,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    pub(crate) fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: Vec::new(),
            total_price: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn restore(
        id: Uuid,
        user_id: Uuid,
        items: Vec<CartItem>,
        total_price: Decimal,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_price,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product == product_id)
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.product).collect()
    }

    pub fn add_item(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartItemError> {
        if quantity < 1 {
            return Err(CartItemError::QuantityTooSmall);
        }
        match self.items.iter_mut().find(|item| item.product == product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartItemError::QuantityTooLarge { max: u32::MAX })?;
            }
            None => self.items.push(CartItem {
                product: product_id,
                quantity,
            }),
        }
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i64) -> Result<(), CartItemError> {
        let position = self
            .items
            .iter()
            .position(|item| item.product == product_id)
            .ok_or(CartItemError::ItemNotFound)?;

        if quantity < 1 {
            self.items.remove(position);
            return Ok(());
        }

        let quantity = u32::try_from(quantity)
            .map_err(|_| CartItemError::QuantityTooLarge { max: u32::MAX })?;
        if let Some(item) = self.items.get_mut(position) {
            item.quantity = quantity;
        }
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn apply_total(&mut self, total: PricedTotal) {
        self.total_price = total.amount();
    }

    pub(crate) fn mark_saved(&mut self, updated_at: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = updated_at;
    }
}
