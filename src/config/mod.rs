//! Configuration management for postgrab
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use postgrab::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Writing bundles to: {}", config.output.dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `POSTGRAB__<section>__<key>`
//!
//! Examples:
//! - `POSTGRAB__RUN__FLATTEN=true`
//! - `POSTGRAB__HTTP__REQUEST_TIMEOUT_SECS=600`
//! - `POSTGRAB__OUTPUT__DIR=/srv/downloads`
//!
//! The gofile account token is a secret and is only read from `GOFILE_TOKEN`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/postgrab.toml`.
//! This can be overridden using the `POSTGRAB_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, GofileSettings, HostsConfig, HttpConfig, NamingConfig, OutputConfig, PagingPolicy,
    ResolverSettings, RetryPolicy,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`POSTGRAB__*`)
    /// 2. TOML file (default: `config/postgrab.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files. Secrets are still
    /// read from the environment.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        sources::load_secrets(&mut config);
        validation::validate(&config)?;
        Ok(config)
    }
}
