use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{error::FieldError, middleware::validate::Validate, models::Product};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub price: Decimal,
    pub discount: Decimal,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub metadata: Value,
    pub is_active: bool,
}

/// Fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub metadata: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn name(&mut self, value: String) -> Option<String> {
        self.min_len("name", value.trim().to_string(), 2, "Name must be at least 2 characters")
    }

    fn description(&mut self, value: String) -> Option<String> {
        self.min_len("description", value, 10, "Description must be at least 10 characters")
    }

    fn sku(&mut self, value: String) -> Option<String> {
        self.min_len("sku", value.trim().to_string(), 3, "SKU must be at least 3 characters")
    }

    fn price(&mut self, value: Decimal) -> Option<Decimal> {
        if value < Decimal::ZERO {
            self.errors.push(FieldError::new("price", "Price cannot be negative"));
            return None;
        }
        Some(value)
    }

    fn discount(&mut self, value: Decimal) -> Option<Decimal> {
        if value < Decimal::ZERO {
            self.errors.push(FieldError::new("discount", "Discount cannot be negative"));
            return None;
        }
        if value > Decimal::from(90) {
            self.errors.push(FieldError::new("discount", "Discount cannot exceed 90%"));
            return None;
        }
        Some(value)
    }

    fn strings(&mut self, field: &str, values: Vec<String>) -> Option<Vec<String>> {
        let values: Vec<String> = values.into_iter().map(|v| v.trim().to_string()).collect();
        if values.iter().any(String::is_empty) {
            self.errors.push(FieldError::new(field, "String cannot be empty"));
            return None;
        }
        Some(values)
    }

    fn stock(&mut self, value: i32) -> Option<i32> {
        if value < 0 {
            self.errors.push(FieldError::new("stock", "Stock cannot be negative"));
            return None;
        }
        Some(value)
    }

    fn metadata(&mut self, value: Value) -> Option<Value> {
        if !value.is_object() {
            self.errors.push(FieldError::new("metadata", "Metadata must be an object"));
            return None;
        }
        Some(value)
    }

    fn required<T>(&mut self, field: &str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.errors.push(FieldError::new(field, message));
        }
        value
    }

    fn min_len(&mut self, field: &str, value: String, min: usize, message: &str) -> Option<String> {
        if value.chars().count() < min {
            self.errors.push(FieldError::new(field, message));
            return None;
        }
        Some(value)
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

impl Validate for CreateProductRequest {
    type Valid = NewProduct;

    fn validate(self) -> Result<NewProduct, Vec<FieldError>> {
        let mut checks = Checks::default();

        let name = checks
            .required("name", self.name, "Product name is required")
            .and_then(|v| checks.name(v));
        let description = checks
            .required("description", self.description, "Product description is required")
            .and_then(|v| checks.description(v));
        let sku = checks
            .required("sku", self.sku, "SKU is required")
            .and_then(|v| checks.sku(v));
        let price = checks
            .required("price", self.price, "Price is required")
            .and_then(|v| checks.price(v));
        let discount = checks.discount(self.discount.unwrap_or(Decimal::ZERO));
        let categories = checks.strings("categories", self.categories.unwrap_or_default());
        let tags = checks.strings("tags", self.tags.unwrap_or_default());
        let images = checks.strings("images", self.images.unwrap_or_default());
        let stock = checks.stock(self.stock.unwrap_or(0));
        let metadata = checks.metadata(self.metadata.unwrap_or_else(|| Value::Object(Default::default())));

        let (
            Some(name),
            Some(description),
            Some(sku),
            Some(price),
            Some(discount),
            Some(categories),
            Some(tags),
            Some(images),
            Some(stock),
            Some(metadata),
        ) = (name, description, sku, price, discount, categories, tags, images, stock, metadata)
        else {
            return Err(checks.errors);
        };

        checks.finish(NewProduct {
            name,
            description,
            sku,
            price,
            discount,
            categories,
            tags,
            images,
            stock,
            metadata,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

impl Validate for UpdateProductRequest {
    type Valid = ProductChanges;

    fn validate(self) -> Result<ProductChanges, Vec<FieldError>> {
        let mut checks = Checks::default();

        let changes = ProductChanges {
            name: self.name.and_then(|v| checks.name(v)),
            description: self.description.and_then(|v| checks.description(v)),
            sku: self.sku.and_then(|v| checks.sku(v)),
            price: self.price.and_then(|v| checks.price(v)),
            discount: self.discount.and_then(|v| checks.discount(v)),
            categories: self.categories.and_then(|v| checks.strings("categories", v)),
            tags: self.tags.and_then(|v| checks.strings("tags", v)),
            images: self.images.and_then(|v| checks.strings("images", v)),
            stock: self.stock.and_then(|v| checks.stock(v)),
            metadata: self.metadata.and_then(|v| checks.metadata(v)),
            is_active: self.is_active,
        };

        checks.finish(changes)
    }
}
