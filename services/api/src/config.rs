//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// Fallback guild used when `DISCORD_GUILD_ID` is not configured.
const DEFAULT_GUILD_ID: &str = "1410277010575724697";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub log_level: Level,
    pub discord_client_id: String,
    pub discord_client_secret: String,
    pub discord_redirect_uri: String,
    /// Bot token used for channel delivery. Optional: without it the
    /// research endpoint reports the credential as unavailable.
    pub discord_bot_token: Option<String>,
    pub discord_guild_id: String,
    /// Public origin used for generated share links and post-logout redirects.
    pub base_url: String,
    pub cors_origin: String,
    /// Production mode adds `Secure` and the cookie domain to session cookies.
    pub production: bool,
    pub cookie_domain: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let mongodb_uri = std::env::var("MONGODB_URI")
            .map_err(|_| ConfigError::MissingVar("MONGODB_URI".to_string()))?;
        let mongodb_db =
            std::env::var("MONGODB_DB").unwrap_or_else(|_| "staff_dashboard".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Discord OAuth Settings ---
        let discord_client_id = std::env::var("DISCORD_CLIENT_ID")
            .map_err(|_| ConfigError::MissingVar("DISCORD_CLIENT_ID".to_string()))?;
        let discord_client_secret = std::env::var("DISCORD_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingVar("DISCORD_CLIENT_SECRET".to_string()))?;
        let discord_redirect_uri = std::env::var("DISCORD_REDIRECT_URI")
            .map_err(|_| ConfigError::MissingVar("DISCORD_REDIRECT_URI".to_string()))?;

        // --- Load Delivery Settings (as optional) ---
        let discord_bot_token = std::env::var("DISCORD_BOT_TOKEN").ok();
        let discord_guild_id = std::env::var("DISCORD_GUILD_ID").unwrap_or_else(|_| {
            tracing::warn!("DISCORD_GUILD_ID not set, using the default guild id");
            DEFAULT_GUILD_ID.to_string()
        });

        // --- Load Link and Cookie Settings ---
        let base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or_else(|_| base_url.clone());
        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let cookie_domain = std::env::var("COOKIE_DOMAIN").ok();

        Ok(Self {
            bind_address,
            mongodb_uri,
            mongodb_db,
            log_level,
            discord_client_id,
            discord_client_secret,
            discord_redirect_uri,
            discord_bot_token,
            discord_guild_id,
            base_url,
            cors_origin,
            production,
            cookie_domain,
        })
    }
}
