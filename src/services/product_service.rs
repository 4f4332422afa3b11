use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::products::{NewProduct, ProductChanges, ProductList},
    entity::products::{self, ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    store::postgres::product_from_entity,
};

/// Active products, newest first.
pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find()
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(to_product)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products fetched successfully",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(ApiResponse::success(
        "Product fetched successfully",
        to_product(product)?,
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: NewProduct,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let now = Utc::now().fixed_offset();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        sku: Set(payload.sku),
        price: Set(payload.price),
        discount: Set(payload.discount),
        categories: Set(serde_json::json!(payload.categories)),
        tags: Set(serde_json::json!(payload.tags)),
        images: Set(serde_json::json!(payload.images)),
        stock: Set(payload.stock),
        metadata: Set(payload.metadata),
        is_active: Set(payload.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.user_id, "product_create", "products")
            .with_metadata(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created successfully",
        to_product(product)?,
        None,
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    changes: ProductChanges,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(product_not_found)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(sku) = changes.sku {
        active.sku = Set(sku);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(discount) = changes.discount {
        active.discount = Set(discount);
    }
    if let Some(categories) = changes.categories {
        active.categories = Set(serde_json::json!(categories));
    }
    if let Some(tags) = changes.tags {
        active.tags = Set(serde_json::json!(tags));
    }
    if let Some(images) = changes.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(stock) = changes.stock {
        active.stock = Set(stock);
    }
    if let Some(metadata) = changes.metadata {
        active.metadata = Set(metadata);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.user_id, "product_update", "products")
            .with_metadata(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully",
        to_product(product)?,
        None,
    ))
}

/// Soft delete: the row stays, but the catalog stops serving it.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(product_not_found)?;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().fixed_offset());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.user_id, "product_delete", "products")
            .with_metadata(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Product soft deleted successfully",
        to_product(product)?,
        None,
    ))
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

fn to_product(model: products::Model) -> AppResult<Product> {
    product_from_entity(model).map_err(|e| AppError::Internal(e.into()))
}
