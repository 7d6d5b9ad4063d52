//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;

/// Default request body limit (10MB), large enough for a recipe photo
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Document store configuration
    pub database: DatabaseConfig,
    /// Image upload configuration
    pub upload: UploadConfig,
    /// Whether `POST /recipes/seed` is available
    pub seed_enabled: bool,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Document store configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection string or file path
    pub url: String,
}

/// Image upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded images are written to
    pub dir: PathBuf,
    /// Maximum accepted request body size in bytes
    pub max_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/recipes.db".to_string()),
            },
            upload: UploadConfig {
                dir: env::var_os("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("uploads")),
                max_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            seed_enabled: env::var("RECIPES_ENABLE_SEED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Anything other than an explicit "off" value counts as enabled
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
