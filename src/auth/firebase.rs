use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{AuthError, TokenVerifier};

/// Google's published signing keys for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_KEY_TTL: Duration = Duration::from_secs(60 * 60);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
}

struct CachedKeys {
    keys: JwkSet,
    expires_at: Instant,
}

#[derive(Default)]
struct KeyCache {
    current: Option<CachedKeys>,
    /// When the key set was last fetched, successful or not
    last_fetch: Option<Instant>,
}

impl KeyCache {
    fn fresh(&self) -> Option<&JwkSet> {
        self.current
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| &cached.keys)
    }

    fn fetched_within(&self, interval: Duration) -> bool {
        self.last_fetch.is_some_and(|at| at.elapsed() < interval)
    }
}

/// Verifies Firebase ID tokens: RS256, audience = project id,
/// issuer = `https://securetoken.google.com/<project id>`.
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    keys: RwLock<KeyCache>,
    refresh_interval: Duration,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            http: reqwest::Client::new(),
            keys: RwLock::new(KeyCache::default()),
            refresh_interval: MIN_REFRESH_INTERVAL,
        }
    }

    /// Read `project_id` from a service account credentials file.
    pub fn from_credentials_file(path: &Path) -> Result<Self, AuthError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Credentials(format!("{}: {}", path.display(), e)))?;
        let account: ServiceAccount = serde_json::from_str(&raw)
            .map_err(|e| AuthError::Credentials(format!("{}: {}", path.display(), e)))?;

        info!(project_id = %account.project_id, "Loaded identity provider credentials");
        Ok(Self::new(account.project_id))
    }

    /// Point key retrieval somewhere other than Google.
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    /// Minimum time between refetches triggered by an unknown key id.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    /// Key for `kid`.
    ///
    /// A stale set is refetched once no matter how many requests are waiting
    /// on it. An unknown `kid` against a fresh set refetches at most once per
    /// `refresh_interval`; otherwise it is rejected from the cache.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.keys.read().await;
            if let Some(keys) = cache.fresh() {
                if keys.find(kid).is_some() || cache.fetched_within(self.refresh_interval) {
                    return key_for(keys, kid);
                }
            }
        }

        // Writers queue here; whoever gets the lock first does the fetch.
        let mut cache = self.keys.write().await;
        if let Some(keys) = cache.fresh() {
            if keys.find(kid).is_some() || cache.fetched_within(self.refresh_interval) {
                return key_for(keys, kid);
            }
        }

        cache.last_fetch = Some(Instant::now());
        let fetched = self.fetch_keys().await?;
        let key = key_for(&fetched.keys, kid);
        cache.current = Some(fetched);
        key
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        debug!(keys = keys.keys.len(), ttl_secs = ttl.as_secs(), "Fetched identity provider keys");
        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + ttl,
        })
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let token_data = decode::<FirebaseClaims>(token, &key, &self.validation())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("token has no subject".to_string()));
        }
        Ok(token_data.claims.sub)
    }
}

fn key_for(keys: &JwkSet, kid: &str) -> Result<DecodingKey, AuthError> {
    let jwk = keys
        .find(kid)
        .ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key '{}'", kid)))?;
    DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// `max-age` from a Cache-Control value.
fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
