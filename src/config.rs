//! Typed configuration from environment variables.
//!
//! Loads once at startup; every variable has a default, but a value that
//! fails to parse is a hard error rather than a silent fallback.

use crate::error::{Error, Result};

/// Environment variable naming the convert binary.
pub const ENV_CONVERT_BIN: &str = "RESIZEQ_CONVERT_BIN";
/// Environment variable for the worker pool size.
pub const ENV_POOL_SIZE: &str = "RESIZEQ_POOL_SIZE";

/// Default number of concurrent convert processes.
pub const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    /// Binary invoked per job (ImageMagick `convert` by default).
    pub convert_bin: String,
    /// Number of worker slots.
    pub pool_size: usize,
    /// Default log level when RUST_LOG is unset.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            convert_bin: std::env::var(ENV_CONVERT_BIN).unwrap_or_else(|_| "convert".to_string()),
            pool_size: pool_size_var()?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn pool_size_var() -> Result<usize> {
    let Ok(raw) = std::env::var(ENV_POOL_SIZE) else {
        return Ok(DEFAULT_POOL_SIZE);
    };
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Error::Config(format!(
            "{ENV_POOL_SIZE} must be a positive integer, got '{raw}'"
        ))),
    }
}
