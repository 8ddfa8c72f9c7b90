// handlers/public/products/reviews.rs - GET /api/products/:id/reviews handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::SafeReview;
use crate::error::ApiError;

use super::parse_product_id;

/// GET /api/products/:id/reviews - reviews in insertion order, author omitted.
///
/// The product itself is not looked up: an unknown id simply has no reviews.
pub async fn product_reviews_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SafeReview>>, ApiError> {
    let product_id = parse_product_id(&id)?;
    let reviews = state.store.list_reviews_for_product(product_id).await?;
    Ok(Json(reviews.into_iter().map(SafeReview::from).collect()))
}
