//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Photo storage service configuration
    pub photo_storage: PhotoStorageConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// Photo storage service configuration
#[derive(Debug, Clone)]
pub struct PhotoStorageConfig {
    /// Base URL of the cloud media API
    pub base_url: String,
    /// API key sent with every storage request
    pub api_key: String,
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
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| {
                    // Default to ~/.member-manager or current directory
                    if let Some(home) = env::var_os("HOME") {
                        format!("{}/.member-manager/members.db", home.to_string_lossy())
                    } else {
                        ".member-manager/members.db".to_string()
                    }
                }),
            },
            photo_storage: PhotoStorageConfig {
                base_url: env::var("PHOTO_API_URL")
                    .unwrap_or_else(|_| "https://api.cloudmedia.example/v1".to_string()),
                api_key: env::var("PHOTO_API_KEY").unwrap_or_default(),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
