use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// CORS for the single configured browser origin. Preflight `OPTIONS`
/// requests are answered here with an empty 200.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = match HeaderValue::from_str(&config.allowed_origin) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!(origin = %config.allowed_origin, "Invalid CORS origin; cross-origin requests will be refused");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, X_REQUESTED_WITH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_secs))
}
