//! Configuration for Connector
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

use crate::types::ConnectorError;

/// Shortest accepted JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEV_JWT_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Connector - REST backend for developer profiles and posts
#[derive(Parser, Debug, Clone)]
#[command(name = "connector")]
#[command(about = "REST backend for developer profiles, posts, likes and comments")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Enable development mode (insecure JWT secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "connector")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "360000")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10240")]
    pub max_body_bytes: usize,
}

impl Args {
    /// Arguments suitable for tests and local experiments (dev mode, no env lookup)
    pub fn dev() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            dev_mode: true,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "connector".to_string(),
            jwt_secret: None,
            jwt_expiry_seconds: 3600,
            log_level: "debug".to_string(),
            log_json: false,
            max_body_bytes: 10240,
        }
    }

    /// Get effective JWT secret (falls back to a fixed secret in dev mode)
    pub fn jwt_secret(&self) -> Result<String, ConnectorError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, true) => Ok(DEV_JWT_SECRET.to_string()),
            (None, false) => Err(ConnectorError::Config(
                "JWT_SECRET is required in production mode".to_string(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match &self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {} characters",
                        MIN_JWT_SECRET_LEN
                    ))
                }
                Some(_) => {}
            }
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }
}
