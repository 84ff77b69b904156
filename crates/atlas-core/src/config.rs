//! Application configuration.
//!
//! Loaded from environment variables (with `dotenvy` in the binary); every
//! section has workable defaults for local development.

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            max_body_size_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/atlas_development".into(),
            pool_size: 10,
        }
    }
}

/// Object-storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage backend: "local" or "s3".
    pub backend: String,
    /// Root directory for the local backend.
    pub local_path: String,
    /// Public base URL for the local backend.
    pub local_base_url: String,
    pub s3: Option<S3Settings>,
    /// Signed-URL lifetime in seconds. Fixed at one hour by default.
    pub signed_url_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".into(),
            local_path: "./storage".into(),
            local_base_url: "http://localhost:3000/storage".into(),
            s3: None,
            signed_url_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_seconds: u64,
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".into(),
            token_expiration_seconds: 24 * 3600,
            password_min_length: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub from_address: String,
    pub from_name: String,
    /// Address receiving contact-form relays.
    pub contact_address: String,
    pub frontend_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@example.com".into(),
            from_name: "Atlas".into(),
            contact_address: "contact@example.com".into(),
            frontend_base_url: "http://localhost:5173".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub subscription_price_id: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            subscription_price_id: String::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            billing: BillingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("ATLAS_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = std::env::var("ATLAS_PORT") {
            if let Ok(port) = v.parse() {
                config.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = std::env::var("DATABASE_POOL_SIZE") {
            if let Ok(size) = v.parse() {
                config.database.pool_size = size;
            }
        }
        if let Ok(v) = std::env::var("STORAGE_BACKEND") {
            config.storage.backend = v;
        }
        if let Ok(v) = std::env::var("STORAGE_LOCAL_PATH") {
            config.storage.local_path = v;
        }
        if let Ok(v) = std::env::var("STORAGE_LOCAL_BASE_URL") {
            config.storage.local_base_url = v;
        }
        if let (Ok(bucket), Ok(region)) = (
            std::env::var("AWS_S3_BUCKET_NAME"),
            std::env::var("AWS_S3_REGION"),
        ) {
            config.storage.s3 = Some(S3Settings {
                bucket,
                region,
                endpoint: std::env::var("AWS_S3_ENDPOINT").ok(),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            });
        }
        if let Ok(v) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("EMAIL_FROM") {
            config.email.from_address = v;
        }
        if let Ok(v) = std::env::var("CONTACT_EMAIL_TO") {
            config.email.contact_address = v;
        }
        if let Ok(v) = std::env::var("FRONTEND_URL") {
            config.email.frontend_base_url = v;
        }
        if let Ok(v) = std::env::var("STRIPE_SECRET_KEY") {
            config.billing.secret_key = v;
        }
        if let Ok(v) = std::env::var("STRIPE_WEBHOOK_SECRET") {
            config.billing.webhook_secret = v;
        }
        if let Ok(v) = std::env::var("STRIPE_PRICE_ID") {
            config.billing.subscription_price_id = v;
        }

        config
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
