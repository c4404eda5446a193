//! Configuration module for the GreenGen client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (auth, tables, storage)
    pub backend_url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    /// Storage bucket for post images
    pub storage_bucket: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let backend_url = env::var("GREENGEN_SUPABASE_URL").unwrap_or_default();
        let anon_key = env::var("GREENGEN_SUPABASE_ANON_KEY").unwrap_or_default();

        let storage_bucket =
            env::var("GREENGEN_STORAGE_BUCKET").unwrap_or_else(|_| "images".to_string());

        let log_level = env::var("GREENGEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            backend_url,
            anon_key,
            storage_bucket,
            log_level,
        }
    }
}
