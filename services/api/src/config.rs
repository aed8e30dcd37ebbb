//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development. The admin allow-list is parsed
//! once here and carried inside `Config`; request handlers receive it through
//! `AppState` rather than reading ambient globals.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

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
    pub database_url: String,
    pub log_level: Level,
    /// Lowercased emails allowed to use the authoring surface.
    pub admin_emails: Vec<String>,
    /// Entitlement endpoint for premium checks. Unset means nobody is a
    /// subscriber (fail closed).
    pub subscription_check_url: Option<String>,
    pub subscription_timeout: Duration,
    /// Where uploaded poster images land on disk.
    pub upload_dir: PathBuf,
    /// Public URL prefix under which `upload_dir` is served.
    pub public_base_url: String,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure tests
    /// are hermetic.
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

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Admin allow-list ---
        let admin_emails = parse_admin_emails(
            &std::env::var("ADMIN_EMAILS").unwrap_or_default(),
        );

        // --- Subscription verification ---
        let subscription_check_url = std::env::var("SUBSCRIPTION_CHECK_URL").ok();
        let subscription_timeout_secs = match std::env::var("SUBSCRIPTION_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SUBSCRIPTION_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => 10,
        };

        // --- Uploads ---
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", bind_address));

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            admin_emails,
            subscription_check_url,
            subscription_timeout: Duration::from_secs(subscription_timeout_secs),
            upload_dir,
            public_base_url,
            cors_origin,
        })
    }

    /// Case-insensitive membership test against the configured allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

/// Splits the comma-separated `ADMIN_EMAILS` value, trimming whitespace and
/// lowercasing so later checks are case-insensitive.
fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_admins(raw: &str) -> Config {
        Config {
            bind_address: "127.0.0.1:3000".parse().unwrap(),
            database_url: "postgres://localhost/test".to_string(),
            log_level: Level::INFO,
            admin_emails: parse_admin_emails(raw),
            subscription_check_url: None,
            subscription_timeout: Duration::from_secs(10),
            upload_dir: PathBuf::from("./uploads"),
            public_base_url: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn admin_emails_are_trimmed_and_lowercased() {
        assert_eq!(
            parse_admin_emails(" Admin@Example.com , second@example.com ,,"),
            vec!["admin@example.com", "second@example.com"]
        );
    }

    #[test]
    fn admin_check_is_case_insensitive() {
        let config = config_with_admins("admin@example.com");
        assert!(config.is_admin("ADMIN@example.COM"));
        assert!(!config.is_admin("learner@example.com"));
    }

    #[test]
    fn empty_allow_list_admits_nobody() {
        let config = config_with_admins("");
        assert!(!config.is_admin(""));
        assert!(!config.is_admin("anyone@example.com"));
    }
}
