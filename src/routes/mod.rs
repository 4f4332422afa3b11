use axum::{Router, http::Uri, routing::get};

use crate::{error::AppError, state::AppState};

pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
}

pub fn create_app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}
