// handlers/protected/reviews/create.rs - POST /api/reviews handler

use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};

use crate::app::AppState;
use crate::database::models::{ClientReview, SafeReview};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// POST /api/reviews - create a review authored by the verified caller.
///
/// The body is decoded regardless of Content-Type; anything that is not a
/// well-formed ClientReview is a 400. The store rejects a star rating
/// outside 1..=5 or a product that does not exist, which is also a 400.
pub async fn review_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<SafeReview>), ApiError> {
    let review: ClientReview = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid review body: {}", e)))?;

    let created = state.store.create_review(&review, &user.user_id).await?;
    tracing::info!(
        review_id = created.id,
        product_id = created.product_id,
        user_id = %user.user_id,
        "Review created"
    );

    Ok((StatusCode::CREATED, Json(SafeReview::from(created))))
}
