// handlers/public/products/mod.rs - Product catalog handlers
//
// Read-only product endpoints. No authentication required.

use crate::error::ApiError;

pub mod list; // GET /api/products
pub mod reviews; // GET /api/products/:id/reviews
pub mod show; // GET /api/products/:id

pub use list::products_list;
pub use reviews::product_reviews_list;
pub use show::product_show;

/// Parse the `:id` path segment as a product id
pub(crate) fn parse_product_id(raw: &str) -> Result<i64, ApiError> {
    if raw.is_empty() {
        return Err(ApiError::bad_request("product id is required"));
    }
    raw.parse::<i64>()
        .map_err(|e| ApiError::bad_request(format!("invalid product id '{}': {}", raw, e)))
}
