use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, AuthProvider};

pub mod firebase;
pub mod jwt;

pub use firebase::FirebaseVerifier;
pub use jwt::{issue_token, SharedSecretVerifier};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("invalid Authorization header: {0}")]
    InvalidToken(String),

    /// The identity provider's signing keys could not be retrieved.
    #[error("identity provider unavailable: {0}")]
    KeyFetch(String),

    #[error("invalid identity provider credentials: {0}")]
    Credentials(String),
}

/// Turns a bearer token into a stable user id.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// Build the verifier selected by `config.provider`.
pub fn verifier_from_config(config: &AuthConfig) -> Result<Arc<dyn TokenVerifier>, AuthError> {
    match config.provider {
        AuthProvider::Firebase => {
            let verifier = match &config.project_id {
                Some(project_id) => FirebaseVerifier::new(project_id.clone()),
                None => FirebaseVerifier::from_credentials_file(&config.credentials_file)?,
            };
            Ok(Arc::new(verifier))
        }
        AuthProvider::SharedSecret => Ok(Arc::new(SharedSecretVerifier::new(&config.jwt_secret)?)),
    }
}

/// Extract the token from an `Authorization` header value.
/// Accepts both `Bearer <token>` and the bare token.
pub fn token_from_header(value: &str) -> Result<&str, AuthError> {
    let value = value.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return Err(AuthError::MalformedHeader),
        None => value,
    };

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}
