//! Configuration loading from environment.

use std::env;

/// Application configuration.
pub struct Config {
    pub database_url: String,
}

impl Config {
    /// Loads configuration from environment variables. `DATABASE_URL`
    /// defaults to a SQLite file in the working directory.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://pspconfig.db".to_string());

        Ok(Self { database_url })
    }
}
