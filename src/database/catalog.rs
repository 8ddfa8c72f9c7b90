use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::database::models::{ClientReview, Product, Review};
use crate::database::pool::DatabaseError;

/// Data access handle shared by every request.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, ascending by id.
    async fn list_products(&self) -> Result<Vec<Product>, DatabaseError>;

    async fn get_product(&self, id: i64) -> Result<Product, DatabaseError>;

    /// Insert a review authored by `author_id` and return the stored row.
    async fn create_review(&self, review: &ClientReview, author_id: &str) -> Result<Review, DatabaseError>;

    /// Reviews for `product_id` in insertion order. Unknown products yield an empty list.
    async fn list_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

const PRODUCT_COLUMNS: &str = "id, name, price, image, description, created_at";
const REVIEW_COLUMNS: &str = "id, user_id, product_id, review_title, review_content, stars, created_at";

/// PostgreSQL implementation of [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!("SELECT {} FROM products ORDER BY id ASC", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product(&self, id: i64) -> Result<Product, DatabaseError> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("product {} not found", id)))
    }

    async fn create_review(&self, review: &ClientReview, author_id: &str) -> Result<Review, DatabaseError> {
        review.validate().map_err(DatabaseError::Validation)?;

        let sql = format!(
            "INSERT INTO reviews (user_id, product_id, review_title, review_content, stars) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REVIEW_COLUMNS
        );
        let created = sqlx::query_as::<_, Review>(&sql)
            .bind(author_id)
            .bind(review.product_id)
            .bind(&review.review_title)
            .bind(&review.review_content)
            .bind(review.stars)
            .fetch_one(&self.pool)
            .await?;

        debug!(review_id = created.id, product_id = created.product_id, "Review created");
        Ok(created)
    }

    async fn list_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE product_id = $1 ORDER BY id ASC",
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
