//! Environment-backed configuration.
//!
//! Values are read once at startup and injected through the application
//! state, so request handling never consults the process environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use rand::{distr::Alphanumeric, Rng};

#[derive(Debug, Clone)]
pub struct Config {
    /// Server port number (default: 8080).
    pub port: u16,
    /// Path to the database file (default: "data.db").
    pub database_path: String,
    /// Base URL of the external image host API.
    pub media_base_url: String,
    /// Empty when no media host is configured; uploads then stay in memory.
    pub media_api_key: String,
    pub media_api_secret: String,
    /// Largest accepted image payload, checked before any upload.
    pub max_upload_bytes: usize,
    /// Timeout applied to every media-host round trip.
    pub upload_timeout: Duration,
    pub admin_password: String,
    /// Secret the admin session tokens are signed with.
    pub token_secret: String,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let token_secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!(
                "TOKEN_SECRET not set, using an ephemeral secret; admin sessions will not survive restarts"
            );
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(32)
                .map(char::from)
                .collect()
        });
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("ADMIN_PASSWORD not set, using the default development password");
            "changeme".to_string()
        });

        Self {
            port: parse_var("PORT", 8080),
            database_path: env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string()),
            media_base_url: env::var("MEDIA_BASE_URL")
                .unwrap_or_else(|_| "https://media.invalid".to_string()),
            media_api_key: env::var("MEDIA_API_KEY").unwrap_or_default(),
            media_api_secret: env::var("MEDIA_API_SECRET").unwrap_or_default(),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            upload_timeout: Duration::from_millis(parse_var("UPLOAD_TIMEOUT_MS", 60_000)),
            admin_password,
            token_secret,
            token_ttl_secs: parse_var("TOKEN_TTL_SECS", 8 * 60 * 60),
        }
    }
}

fn parse_var<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("invalid {key} value {raw:?}, using default");
                default
            }
        },
        Err(_) => default,
    }
}
