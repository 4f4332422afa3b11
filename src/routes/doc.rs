use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemView, CartResponse, UpdateCartItemRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    error::FieldError,
    models::{Product, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::me,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product
    ),
    components(
        schemas(
            User,
            Product,
            FieldError,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemView,
            CartResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            params::Pagination,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cart_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/cart"));
        assert!(paths.contains_key("/api/cart/{product_id}"));
        assert!(paths.contains_key("/api/products/{id}"));
        assert!(paths.contains_key("/api/auth/login"));
        assert!(paths.contains_key("/api/auth/me"));
    }
}
