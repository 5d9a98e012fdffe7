//! Configuration management

use anyhow::{self, Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Base URL of the external chatbot service
    pub chatbot_url: String,

    /// JWT secret key for token signing/validation
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let chatbot_url = std::env::var("CHATBOT_URL")
            .unwrap_or_else(|_| "http://localhost:5005".to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET must be set — generate one with: openssl rand -base64 48")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!(
                "JWT_SECRET must be at least 32 bytes (current: {} bytes). Generate one with: openssl rand -base64 48",
                jwt_secret.len()
            );
        }

        const KNOWN_DEV_SECRETS: &[&str] = &[
            "dev-secret-change-in-production-min-32-bytes!!",
        ];
        if KNOWN_DEV_SECRETS.contains(&jwt_secret.as_str()) {
            tracing::warn!("⚠ JWT_SECRET matches a known default — change it for production!");
        }

        Ok(Self {
            nats_url,
            database_url,
            chatbot_url,
            jwt_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-at-least-32-bytes-long";

    #[test]
    fn test_config_chatbot_url_uses_local_when_set() {
        std::env::set_var("CHATBOT_URL", "http://localhost:9100");
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_SECRET", TEST_SECRET);

        let config = Config::from_env().unwrap();
        assert_eq!(config.chatbot_url, "http://localhost:9100");

        // Cleanup
        std::env::remove_var("CHATBOT_URL");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_chatbot_url_defaults_when_not_set() {
        std::env::remove_var("CHATBOT_URL");
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_SECRET", TEST_SECRET);

        let config = Config::from_env().unwrap();
        assert_eq!(config.chatbot_url, "http://localhost:5005");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_rejects_short_jwt_secret() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_SECRET", "too-short");

        let result = Config::from_env();
        assert!(result.is_err());

        std::env::set_var("JWT_SECRET", TEST_SECRET);
    }
}
