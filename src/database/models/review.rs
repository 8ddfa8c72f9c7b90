use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MIN_STARS: i32 = 1;
pub const MAX_STARS: i32 = 5;

/// A stored review, including its author. Never serialized to callers; see [`SafeReview`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Review {
    pub id: i64,
    pub user_id: String,
    pub product_id: i64,
    pub review_title: String,
    pub review_content: String,
    pub stars: i32,
    pub created_at: DateTime<Utc>,
}

/// Review body accepted from callers. The author comes from the verified token,
/// so any `userId` in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReview {
    pub product_id: i64,
    pub review_title: String,
    pub review_content: String,
    pub stars: i32,
}

impl ClientReview {
    /// Boundary checks mirroring the table constraints.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_STARS..=MAX_STARS).contains(&self.stars) {
            return Err(format!(
                "stars must be between {} and {}, got {}",
                MIN_STARS, MAX_STARS, self.stars
            ));
        }
        if self.product_id <= 0 {
            return Err(format!("invalid productId {}", self.product_id));
        }
        Ok(())
    }
}

/// Public view of a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeReview {
    pub id: i64,
    pub product_id: i64,
    pub review_title: String,
    pub review_content: String,
    pub stars: i32,
}

impl From<Review> for SafeReview {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            product_id: review.product_id,
            review_title: review.review_title,
            review_content: review.review_content,
            stars: review.stars,
        }
    }
}
