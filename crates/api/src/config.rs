//! # API Configuration Module
//!
//! This module handles loading and managing configuration for the LearnHub API
//! server. It retrieves configuration values from environment variables and
//! provides defaults where appropriate.
//!
//! ## Environment Variables
//!
//! The following environment variables are used:
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `EVENT_REMINDER_HOURS_BEFORE`: Comma-separated reminder lead times in
//!   hours (default: "24,1")
//! - `NOTIFICATION_EXPIRY_DAYS`: Days before a notification expires
//!   (default: 30)

use eyre::{Result, WrapErr};
use std::env;
use tracing::Level;

/// Configuration for the LearnHub API server
///
/// This struct encapsulates all configuration options for the API server,
/// including networking, database connections, and lifecycle-engine tuning.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Reminder lead times in hours before an event starts
    pub reminder_hours: Vec<i64>,

    /// Days a notification stays readable before cleanup deletes it
    pub notification_expiry_days: i64,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// Loads configuration values from environment variables, providing
    /// sensible defaults where possible. DATABASE_URL is required and will
    /// cause an error if not set.
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Lifecycle engine settings
        let reminder_hours = parse_reminder_hours(
            &env::var("EVENT_REMINDER_HOURS_BEFORE").unwrap_or_else(|_| "24,1".to_string()),
        )
        .wrap_err("Invalid EVENT_REMINDER_HOURS_BEFORE value")?;
        let notification_expiry_days = env::var("NOTIFICATION_EXPIRY_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .wrap_err("Invalid NOTIFICATION_EXPIRY_DAYS value")?;

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            reminder_hours,
            notification_expiry_days,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses a comma-separated list of positive reminder lead times.
pub fn parse_reminder_hours(raw: &str) -> Result<Vec<i64>> {
    let mut hours = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let value: i64 = part
            .parse()
            .wrap_err_with(|| format!("not a number: {:?}", part))?;
        if value <= 0 {
            eyre::bail!("reminder lead time must be positive, got {}", value);
        }
        hours.push(value);
    }
    if hours.is_empty() {
        eyre::bail!("no reminder lead times configured");
    }
    Ok(hours)
}
