use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::cart::{AddToCartRequest, CartResponse, UpdateCartItemRequest},
    error::{AppError, AppResult, FieldError},
    middleware::{auth::AuthUser, validate::ValidJson},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_cart)
                .post(add_to_cart)
                .patch(update_cart_item)
                .delete(clear_cart),
        )
        .route("/{product_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current user's cart with resolved products", body = ApiResponse<CartResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let details = state.carts.get(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Cart items fetched successfully",
        CartResponse::from(details),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Item added or merged", body = ApiResponse<CartResponse>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(item): ValidJson<AddToCartRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartResponse>>)> {
    let cart = state
        .carts
        .add(user.user_id, item.product_id, item.quantity)
        .await?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.user_id, "cart_add", "carts").with_metadata(
            serde_json::json!({ "product_id": item.product_id, "quantity": item.quantity }),
        ),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Item added to cart successfully",
            CartResponse::from(&cart),
            None,
        )),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity replaced; quantities below 1 remove the item", body = ApiResponse<CartResponse>),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Cart or item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(change): ValidJson<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = state
        .carts
        .update(user.user_id, change.product_id, change.quantity)
        .await?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.user_id, "cart_update", "carts").with_metadata(
            serde_json::json!({ "product_id": change.product_id, "quantity": change.quantity }),
        ),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Cart item quantity updated successfully",
        CartResponse::from(&cart),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Item removed (or was not present)", body = ApiResponse<CartResponse>),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let product_id = Uuid::parse_str(&product_id).map_err(|_| {
        AppError::Validation(vec![FieldError::new("productId", "Invalid product ID")])
    })?;
    let cart = state.carts.remove(user.user_id, product_id).await?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.user_id, "cart_remove", "carts")
            .with_metadata(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Item removed from cart successfully",
        CartResponse::from(&cart),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartResponse>),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = state.carts.clear(user.user_id).await?;

    audit::record(&state.pool, AuditEntry::new(user.user_id, "cart_clear", "carts")).await;

    Ok(Json(ApiResponse::success(
        "Cart cleared successfully",
        CartResponse::from(&cart),
        None,
    )))
}
