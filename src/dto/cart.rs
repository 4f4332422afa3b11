use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::FieldError,
    middleware::validate::Validate,
    models::{Cart, Product},
    services::cart_service::CartDetails,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct AddItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

impl Validate for AddToCartRequest {
    type Valid = AddItem;

    fn validate(self) -> Result<AddItem, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.product_id.is_none() {
            errors.push(FieldError::new("productId", "Product ID is required"));
        }
        let quantity = match self.quantity {
            None => {
                errors.push(FieldError::new("quantity", "Quantity is required"));
                None
            }
            Some(q) if q < 1 => {
                errors.push(FieldError::new("quantity", "Quantity must be at least 1"));
                None
            }
            Some(q) => match u32::try_from(q) {
                Ok(q) => Some(q),
                Err(_) => {
                    errors.push(FieldError::new("quantity", "Quantity is too large"));
                    None
                }
            },
        };

        match (self.product_id, quantity) {
            (Some(product_id), Some(quantity)) if errors.is_empty() => Ok(AddItem {
                product_id,
                quantity,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub product_id: Option<Uuid>,
    /// Values below 1 remove the item.
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct SetQuantity {
    pub product_id: Uuid,
    pub quantity: i64,
}

impl Validate for UpdateCartItemRequest {
    type Valid = SetQuantity;

    fn validate(self) -> Result<SetQuantity, Vec<FieldError>> {
        match (self.product_id, self.quantity) {
            (Some(product_id), Some(quantity)) => Ok(SetQuantity {
                product_id,
                quantity,
            }),
            (product_id, quantity) => {
                let mut errors = Vec::new();
                if product_id.is_none() {
                    errors.push(FieldError::new("productId", "Product ID is required"));
                }
                if quantity.is_none() {
                    errors.push(FieldError::new("quantity", "Quantity is required"));
                }
                Err(errors)
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: Uuid,
    pub quantity: u32,
    /// Current catalog entry; only resolved when reading the cart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub items: Vec<CartItemView>,
    /// Priced at the last mutation, not at read time.
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id(),
            user: cart.user_id(),
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product,
                    quantity: item.quantity,
                    product: None,
                })
                .collect(),
            total_price: cart.total_price(),
            created_at: cart.created_at(),
            updated_at: cart.updated_at(),
        }
    }
}

impl From<CartDetails> for CartResponse {
    fn from(details: CartDetails) -> Self {
        let mut response = CartResponse::from(&details.cart);
        for item in &mut response.items {
            item.product = details.product(item.product_id).cloned();
        }
        response
    }
}
