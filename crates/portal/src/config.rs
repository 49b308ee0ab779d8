//! Configuration management for the portal service.
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind host
    pub host: String,

    /// Server bind port
    pub port: u16,

    /// SQLite database URL
    pub database_url: String,

    /// Public base URL, used for checkout success/cancel redirects
    pub base_url: String,

    /// Payment processor API base URL
    pub checkout_api_url: String,

    /// Payment processor secret key
    pub checkout_secret_key: String,

    /// Shared secret for webhook signature verification
    pub webhook_secret: String,

    /// Email provider API URL; when unset, outgoing mail is only logged
    pub email_api_url: Option<String>,

    /// Email provider API key
    pub email_api_key: String,

    /// From address for outgoing mail
    pub email_from: String,

    /// Secret for signing session tokens
    pub session_secret: String,

    /// Salt mixed into password hashes
    pub password_salt: String,

    /// Minutes before an unsettled card registration is swept
    pub pending_ttl_minutes: i64,

    /// Seconds between sweeps of stale pending registrations
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            host: lookup("PORTAL_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PORTAL_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid PORTAL_PORT")?,

            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://sprout.db".to_string()),

            base_url: lookup("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),

            checkout_api_url: lookup("CHECKOUT_API_URL")
                .unwrap_or_else(|| "https://api.payments.example.com".to_string()),

            checkout_secret_key: lookup("CHECKOUT_SECRET_KEY")
                .unwrap_or_else(|| "sk_test_dev".to_string()),

            webhook_secret: lookup("WEBHOOK_SECRET").unwrap_or_else(|| "whsec_dev".to_string()),

            email_api_url: lookup("EMAIL_API_URL"),

            email_api_key: lookup("EMAIL_API_KEY").unwrap_or_default(),

            email_from: lookup("EMAIL_FROM")
                .unwrap_or_else(|| "Coding Sprout <noreply@codingsprout.com>".to_string()),

            session_secret: lookup("SESSION_SECRET")
                .unwrap_or_else(|| "dev-session-secret".to_string()),

            password_salt: lookup("PASSWORD_SALT")
                .unwrap_or_else(|| "dev-password-salt".to_string()),

            pending_ttl_minutes: lookup("PENDING_TTL_MINUTES")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .context("Invalid PENDING_TTL_MINUTES")?,

            sweep_interval_secs: lookup("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|| "300".to_string())
                .parse()
                .context("Invalid SWEEP_INTERVAL_SECS")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.pending_ttl_minutes >= 1,
            "PENDING_TTL_MINUTES must be at least 1"
        );
        anyhow::ensure!(
            self.sweep_interval_secs >= 1,
            "SWEEP_INTERVAL_SECS must be at least 1"
        );
        anyhow::ensure!(!self.session_secret.is_empty(), "SESSION_SECRET must be set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        // No variables set: every field falls back to its default,
        // regardless of what the host process environment holds.
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.pending_ttl_minutes, 60);
        assert!(config.database_url.starts_with("sqlite:"));
        assert!(config.email_api_url.is_none());
    }

    #[test]
    fn test_config_reads_overrides() {
        let config = Config::from_lookup(|key| match key {
            "PORTAL_PORT" => Some("9090".to_string()),
            "PENDING_TTL_MINUTES" => Some("15".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.pending_ttl_minutes, 15);
    }

    #[test]
    fn test_config_rejects_a_bad_port() {
        let err = Config::from_lookup(|key| {
            (key == "PORTAL_PORT").then(|| "not-a-port".to_string())
        });
        assert!(err.is_err());
    }
}
