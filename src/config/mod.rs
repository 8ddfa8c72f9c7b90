use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            Some("test") => Environment::Test,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Connection URL for the pool. The password is percent-encoded.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let mut url = url::Url::parse(&format!("postgres://{}:{}", self.host, self.port))
            .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_username(&self.user)
            .map_err(|_| ConfigError::InvalidDatabaseUrl("cannot set username".to_string()))?;
        url.set_password(Some(&self.password))
            .map_err(|_| ConfigError::InvalidDatabaseUrl("cannot set password".to_string()))?;
        url.set_path(&format!("/{}", self.name));
        url.query_pairs_mut().append_pair("sslmode", &self.ssl_mode);
        Ok(url.into())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    /// Firebase ID tokens checked against Google's published keys
    Firebase,
    /// HS256 tokens signed with `AUTH_JWT_SECRET`
    SharedSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub provider: AuthProvider,
    pub credentials_file: PathBuf,
    pub project_id: Option<String>,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub max_age_secs: u64,
}

impl AppConfig {
    /// Load `.env.<environment>` and `.env` if present, then read the process environment.
    pub fn load() -> Self {
        let environment = Environment::parse(env::var("APP_ENV").ok().as_deref());
        let _ = dotenvy::from_filename(format!(".env.{}", environment.as_str()));
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Presets are chosen by `APP_ENV`
    /// and then overridden key by key.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(lookup("APP_ENV").as_deref());

        match environment {
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("SERVER_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("SERVER_SHUTDOWN_GRACE_SECS") {
            self.server.shutdown_grace_secs = v.parse().unwrap_or(self.server.shutdown_grace_secs);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_SSLMODE") {
            self.database.ssl_mode = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Auth overrides
        if let Some(v) = lookup("AUTH_PROVIDER") {
            self.auth.provider = match v.as_str() {
                "firebase" => AuthProvider::Firebase,
                "shared-secret" | "shared_secret" | "jwt" => AuthProvider::SharedSecret,
                _ => self.auth.provider,
            };
        }
        if let Some(v) = lookup("FIREBASE_CREDENTIALS_FILE") {
            self.auth.credentials_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("FIREBASE_PROJECT_ID") {
            self.auth.project_id = Some(v);
        }
        if let Some(v) = lookup("AUTH_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }

        // CORS overrides
        if let Some(v) = lookup("CORS_ALLOWED_ORIGIN") {
            self.cors.allowed_origin = v.trim().to_string();
        }
        if let Some(v) = lookup("CORS_MAX_AGE_SECS") {
            self.cors.max_age_secs = v.parse().unwrap_or(self.cors.max_age_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                shutdown_grace_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                name: "postgres_development".to_string(),
                ssl_mode: "disable".to_string(),
                max_connections: 10,
                acquire_timeout_secs: 30,
                run_migrations: true,
            },
            auth: AuthConfig {
                provider: AuthProvider::Firebase,
                credentials_file: PathBuf::from("../serviceAccountKey.json"),
                project_id: None,
                jwt_secret: String::new(),
            },
            cors: CorsConfig {
                allowed_origin: "http://localhost:3000".to_string(),
                max_age_secs: 24 * 60 * 60,
            },
        }
    }

    fn test() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Test;
        config.database.name = "postgres_test".to_string();
        config.database.max_connections = 5;
        config.database.acquire_timeout_secs = 10;
        config.auth.provider = AuthProvider::SharedSecret;
        config
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                shutdown_grace_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: String::new(),
                name: "postgres".to_string(),
                ssl_mode: "require".to_string(),
                max_connections: 50,
                acquire_timeout_secs: 5,
                run_migrations: false,
            },
            auth: AuthConfig {
                provider: AuthProvider::Firebase,
                credentials_file: PathBuf::from("../serviceAccountKey.json"),
                project_id: None,
                jwt_secret: String::new(),
            },
            cors: CorsConfig {
                allowed_origin: "http://localhost:3000".to_string(),
                max_age_secs: 24 * 60 * 60,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::load);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
