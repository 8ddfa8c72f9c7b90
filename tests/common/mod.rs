#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

use catalog_api::{
    app::{self, AppState},
    auth::{AuthError, TokenVerifier},
    config::CorsConfig,
    database::{
        models::{ClientReview, Product, Review},
        CatalogStore, DatabaseError,
    },
    server::{serve_until, ServerError},
};

pub const ORIGIN: &str = "http://localhost:3000";

/// Catalog held in memory, with the same constraints as the tables.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<Vec<Product>>,
    reviews: Mutex<Vec<Review>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    /// Every stored review, authors included
    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.lock().unwrap().clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, DatabaseError> {
        self.check_available()?;
        let mut products = self.products.lock().unwrap().clone();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn get_product(&self, id: i64) -> Result<Product, DatabaseError> {
        self.check_available()?;
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("product {} not found", id)))
    }

    async fn create_review(&self, review: &ClientReview, author_id: &str) -> Result<Review, DatabaseError> {
        self.check_available()?;
        review.validate().map_err(DatabaseError::Validation)?;

        let exists = self.products.lock().unwrap().iter().any(|p| p.id == review.product_id);
        if !exists {
            return Err(DatabaseError::Validation(format!(
                "product {} does not exist",
                review.product_id
            )));
        }

        let mut reviews = self.reviews.lock().unwrap();
        let stored = Review {
            id: reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            user_id: author_id.to_string(),
            product_id: review.product_id,
            review_title: review.review_title.clone(),
            review_content: review.review_content.clone(),
            stars: review.stars,
            created_at: Utc::now(),
        };
        reviews.push(stored.clone());
        Ok(stored)
    }

    async fn list_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, DatabaseError> {
        self.check_available()?;
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check_available()
    }
}

/// Accepts a fixed set of tokens, each mapped to a user id.
pub struct StaticVerifier {
    users: HashMap<String, String>,
}

impl StaticVerifier {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            users: pairs
                .iter()
                .map(|(token, user)| (token.to_string(), user.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }
}

pub fn product(id: i64, name: &str, price_cents: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        price: Decimal::new(price_cents, 2),
        image: None,
        description: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Products 1 "A" at 10.00 and 2 "B" at 20.00
pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_products(vec![product(1, "A", 1000), product(2, "B", 2000)]))
}

pub fn cors_config() -> CorsConfig {
    CorsConfig {
        allowed_origin: ORIGIN.to_string(),
        max_age_secs: 600,
    }
}

/// An API server on a free local port, backed by `store`.
/// Token "t1" authenticates as "u1" and "t2" as "u2".
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestApp {
    pub async fn spawn(store: Arc<MemoryStore>) -> Result<Self> {
        let verifier = Arc::new(StaticVerifier::new(&[("t1", "u1"), ("t2", "u2")]));
        Self::spawn_with(AppState::new(store, verifier), Duration::from_secs(5)).await
    }

    pub async fn spawn_with(state: AppState, grace: Duration) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        let (stop, stopped) = oneshot::channel::<()>();
        let service = app::service(state, &cors_config());
        let handle = tokio::spawn(serve_until(
            listener,
            service,
            async move {
                let _ = stopped.await;
            },
            grace,
        ));

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            stop: Some(stop),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Trigger graceful shutdown and wait for the server to finish.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.expect("server task panicked")
    }
}
