// handlers/public/products/show.rs - GET /api/products/:id handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::Product;
use crate::error::ApiError;

use super::parse_product_id;

/// GET /api/products/:id - single product, 404 when it does not exist
pub async fn product_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;
    let product = state.store.get_product(id).await?;
    Ok(Json(product))
}
