use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{token_from_header, AuthError};
use crate::error::ApiError;

/// Identity of the caller, as vouched for by the token verifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Bearer token authentication for protected routes.
///
/// Verifies the `Authorization` header and hands the resulting [`AuthUser`]
/// to the handler through request extensions. Requests without a valid
/// token never reach the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), "Rejected request: {}", e);
        ApiError::from(e)
    })?;

    let user_id = state.verifier.verify(token).await.map_err(|e| {
        tracing::warn!(path = %request.uri().path(), "Token verification failed: {}", e);
        ApiError::from(e)
    })?;

    tracing::debug!(user_id = %user_id, "Request authenticated");
    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Extract the token from the Authorization header
fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    token_from_header(value)
}
