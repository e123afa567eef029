use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;

/// Matching run every day at 02:00.
pub const DEFAULT_MATCHING_CRON: &str = "0 0 2 * * *";

/// Expiration sweep every hour.
pub const DEFAULT_EXPIRATION_CRON: &str = "0 0 * * * *";

pub const DEFAULT_MATCH_EXPIRY_DAYS: i64 = 7;

/// Runtime knobs for the matching engine.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// How long a proposed match stays open.
    pub match_expiry: Duration,
    /// Cap on the eligible pool per run. `None` means no cap.
    pub max_pool_size: Option<usize>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            match_expiry: Duration::days(DEFAULT_MATCH_EXPIRY_DAYS),
            max_pool_size: None,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub expo_access_token: Option<String>,
    pub matching_cron: String,
    pub expiration_cron: String,
    pub matching: MatchingConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let max_pool_size = env::var("MATCH_POOL_LIMIT")
            .ok()
            .map(|value| value.parse::<usize>())
            .transpose()
            .context("MATCH_POOL_LIMIT must be a positive integer")?;

        let expiry_days: i64 = env::var("MATCH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_MATCH_EXPIRY_DAYS.to_string())
            .parse()
            .context("MATCH_EXPIRY_DAYS must be a valid number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok(),
            matching_cron: env::var("MATCHING_CRON")
                .unwrap_or_else(|_| DEFAULT_MATCHING_CRON.to_string()),
            expiration_cron: env::var("EXPIRATION_CRON")
                .unwrap_or_else(|_| DEFAULT_EXPIRATION_CRON.to_string()),
            matching: MatchingConfig {
                match_expiry: Duration::days(expiry_days),
                max_pool_size,
            },
        })
    }
}
