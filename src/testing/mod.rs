use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::database::models::{Product, Review};
use crate::database::pool::run_migrations;
use crate::database::PgCatalog;

/// A throwaway database owned by one test.
///
/// `create` hands back the fixture that owns both the catalog handle and the
/// database it points at; `teardown` closes the pool and drops the database.
pub struct TestDatabase {
    catalog: PgCatalog,
    admin: PgPool,
    name: String,
}

impl TestDatabase {
    /// Returns `None` (and the test should return early) when `DATABASE_URL` is not set.
    pub async fn create() -> Option<Self> {
        let base_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                eprintln!("DATABASE_URL not set; skipping store test");
                return None;
            }
        };

        let db = Self::create_from(&base_url)
            .await
            .expect("failed to create test database from DATABASE_URL");
        Some(db)
    }

    async fn create_from(base_url: &str) -> anyhow::Result<Self> {
        let admin = PgPoolOptions::new().max_connections(1).connect(base_url).await?;

        let name = format!("catalog_test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(&name)))
            .execute(&admin)
            .await?;

        let mut url = url::Url::parse(base_url)?;
        url.set_path(&format!("/{}", name));

        let pool = PgPoolOptions::new().max_connections(5).connect(url.as_str()).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            catalog: PgCatalog::new(pool),
            admin,
            name,
        })
    }

    pub fn catalog(&self) -> &PgCatalog {
        &self.catalog
    }

    pub async fn teardown(self) {
        self.catalog.pool().close().await;
        let drop = format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", quote_identifier(&self.name));
        if let Err(e) = sqlx::query(&drop).execute(&self.admin).await {
            eprintln!("failed to drop test database {}: {}", self.name, e);
        }
        self.admin.close().await;
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Product row to seed, with an explicit id.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub description: Option<String>,
}

pub fn product(id: i64, name: &str, price_cents: i64) -> NewProduct {
    NewProduct {
        id,
        name: name.to_string(),
        price: Decimal::new(price_cents, 2),
        image: Some("https://via.placeholder.com/150".to_string()),
        description: Some(format!("{} description", name)),
    }
}

/// Review row to seed, with an explicit id and author.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: i64,
    pub user_id: String,
    pub product_id: i64,
    pub review_title: String,
    pub review_content: String,
    pub stars: i32,
}

pub fn review(id: i64, user_id: &str, product_id: i64, title: &str, stars: i32) -> NewReview {
    NewReview {
        id,
        user_id: user_id.to_string(),
        product_id,
        review_title: title.to_string(),
        review_content: format!("{} content", title),
        stars,
    }
}

/// Insert products in one transaction and move the id sequence past them.
pub async fn seed_products(pool: &PgPool, rows: &[NewProduct]) -> Result<Vec<Product>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(rows.len());

    for row in rows {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, price, image, description) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, price, image, description, created_at",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(row.price)
        .bind(&row.image)
        .bind(&row.description)
        .fetch_one(&mut *tx)
        .await?;
        inserted.push(product);
    }

    sqlx::query("SELECT setval(pg_get_serial_sequence('products', 'id'), COALESCE(MAX(id), 1)) FROM products")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(inserted)
}

/// Insert reviews in one transaction and move the id sequence past them.
pub async fn seed_reviews(pool: &PgPool, rows: &[NewReview]) -> Result<Vec<Review>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(rows.len());
    let created_at: DateTime<Utc> = Utc::now();

    for row in rows {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, user_id, product_id, review_title, review_content, stars, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, product_id, review_title, review_content, stars, created_at",
        )
        .bind(row.id)
        .bind(&row.user_id)
        .bind(row.product_id)
        .bind(&row.review_title)
        .bind(&row.review_content)
        .bind(row.stars)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;
        inserted.push(review);
    }

    sqlx::query("SELECT setval(pg_get_serial_sequence('reviews', 'id'), COALESCE(MAX(id), 1)) FROM reviews")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("catalog_test_1"), "\"catalog_test_1\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn product_helper_uses_cents() {
        let p = product(1, "A", 1000);
        assert_eq!(p.price, Decimal::new(1000, 2));
        assert_eq!(p.price.to_string(), "10.00");
    }
}
