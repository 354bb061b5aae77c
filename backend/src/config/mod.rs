//! Configuration management for Notekeeper
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use thiserror::Error;

const DEV_ACCESS_SECRET: &str = "development-access-secret-change-in-production";
const DEV_REFRESH_SECRET: &str = "development-refresh-secret-change-in-production";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// Where notes, lists, labels and users are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid storage backend: '{}'. Expected: postgres or memory",
                s
            ))),
        }
    }
}

/// Cloudinary account credentials
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    pub storage_backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Secret used to sign access tokens
    pub access_token_secret: String,

    /// Access token TTL in seconds (default: 86400 = 1 day)
    pub access_token_ttl_seconds: i64,

    /// Secret used to sign refresh tokens
    pub refresh_token_secret: String,

    /// Refresh token TTL in days (default: 10)
    pub refresh_token_ttl_days: i64,

    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,

    /// Whether auth cookies carry the `Secure` attribute
    pub cookie_secure: bool,

    /// CORS allowed origins (comma separated)
    pub cors_origin: Option<String>,

    /// Upper bound for multipart request bodies
    pub max_upload_bytes: usize,

    /// Image store credentials; `None` selects the in-memory store
    pub cloudinary: Option<CloudinaryConfig>,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .map(|s| StorageBackend::from_str(&s))
            .unwrap_or(Ok(StorageBackend::Postgres))?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .unwrap_or(5);

        let access_token_secret =
            secret_from_env("ACCESS_TOKEN_SECRET", DEV_ACCESS_SECRET, &environment)?;
        let refresh_token_secret =
            secret_from_env("REFRESH_TOKEN_SECRET", DEV_REFRESH_SECRET, &environment)?;

        if environment.is_production() && access_token_secret == refresh_token_secret {
            return Err(ConfigError::InvalidValue(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".to_string(),
            ));
        }

        let access_token_ttl_seconds = env::var("ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<i64>()
            .unwrap_or(86400);

        let refresh_token_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<i64>()
            .unwrap_or(10);

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|s| !matches!(s.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|s| !s.trim().is_empty());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse::<usize>()
            .unwrap_or(10 * 1024 * 1024);

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_API_KEY"),
            env::var("CLOUDINARY_API_SECRET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar(
                    "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY or CLOUDINARY_API_SECRET"
                        .to_string(),
                ))
            }
            _ => None,
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            environment,
            port,
            storage_backend,
            database_url,
            db_max_connections,
            access_token_secret,
            access_token_ttl_seconds,
            refresh_token_secret,
            refresh_token_ttl_days,
            bcrypt_cost,
            cookie_secure,
            cors_origin,
            max_upload_bytes,
            cloudinary,
            log_level,
        })
    }

    /// Database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> String {
        let Some(url) = self.database_url.as_deref() else {
            return String::new();
        };
        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                let prefix = &url[..colon_pos + 1];
                let suffix = &url[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        url.to_string()
    }

    /// Configuration suitable for tests and local experiments
    pub fn for_development() -> Self {
        Config {
            environment: Environment::Development,
            port: 8000,
            storage_backend: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 5,
            access_token_secret: DEV_ACCESS_SECRET.to_string(),
            access_token_ttl_seconds: 86400,
            refresh_token_secret: DEV_REFRESH_SECRET.to_string(),
            refresh_token_ttl_days: 10,
            bcrypt_cost: 4,
            cookie_secure: true,
            cors_origin: None,
            max_upload_bytes: 10 * 1024 * 1024,
            cloudinary: None,
            log_level: "info".to_string(),
        }
    }
}

fn secret_from_env(
    name: &str,
    dev_default: &str,
    environment: &Environment,
) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(secret) if !secret.is_empty() => Ok(secret),
        _ if environment.is_production() => Err(ConfigError::MissingEnvVar(name.to_string())),
        _ => {
            tracing::warn!("{} not set, using development secret", name);
            Ok(dev_default.to_string())
        }
    }
}
