pub mod auth_service;
pub mod cart_service;
pub mod pricing;
pub mod product_service;
