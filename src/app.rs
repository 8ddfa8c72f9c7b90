use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::auth::TokenVerifier;
use crate::config::CorsConfig;
use crate::database::CatalogStore;
use crate::handlers;
use crate::middleware::{cors_layer, require_auth};

/// Shared per-request dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { store, verifier }
    }
}

/// The routed application, without path normalization.
pub fn app(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        // Public
        .route("/health", get(handlers::public::health))
        .merge(product_routes())
        // Protected
        .merge(review_routes(state.clone()))
        // Global middleware (last added runs first)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

/// The application as served: `/api/products/` and `/api/products` are the same route.
pub fn service(state: AppState, cors: &CorsConfig) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app(state, cors))
}

fn product_routes() -> Router<AppState> {
    use handlers::public::products;

    Router::new()
        .route("/api/products", get(products::products_list))
        .route("/api/products/:id", get(products::product_show))
        .route("/api/products/:id/reviews", get(products::product_reviews_list))
}

fn review_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::reviews;

    Router::new()
        .route("/api/reviews", post(reviews::review_create))
        // Only matched routes are authenticated; unknown paths stay 404
        .route_layer(from_fn_with_state(state, require_auth))
}
