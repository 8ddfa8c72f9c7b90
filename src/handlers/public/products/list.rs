// handlers/public/products/list.rs - GET /api/products handler

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::database::models::Product;
use crate::error::ApiError;

/// GET /api/products - every product, ascending by id
pub async fn products_list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products().await?;
    tracing::debug!(count = products.len(), "Listed products");
    Ok(Json(products))
}
