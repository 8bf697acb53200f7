// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! All values are read once at startup and cached in memory for the
//! lifetime of the process.

use std::env;

/// Break-glass administrator account.
///
/// A caller whose verified email matches this address is treated as an
/// admin even without the admin custom claim. Override with the
/// SUPER_ADMIN_EMAIL environment variable.
pub const SUPER_ADMIN_EMAIL: &str = "founder@studylens.app";

/// Prompt quota granted to new accounts.
pub const DEFAULT_PROMPT_LIMIT: u32 = 50;

/// Length of the trial window granted on first login.
pub const DEFAULT_TRIAL_DAYS: i64 = 7;

/// Usage counters reset this many days after the window opens.
pub const USAGE_RESET_PERIOD_DAYS: i64 = 7;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (also the expected ID-token audience)
    pub gcp_project_id: String,
    /// Frontend URL for CORS allow-listing
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Break-glass admin email
    pub super_admin_email: String,
    /// Prompt quota for new accounts
    pub default_prompt_limit: u32,
    /// Trial window length in days
    pub trial_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            super_admin_email: env::var("SUPER_ADMIN_EMAIL")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| SUPER_ADMIN_EMAIL.to_string()),
            default_prompt_limit: env::var("DEFAULT_PROMPT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PROMPT_LIMIT),
            trial_days: env::var("TRIAL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TRIAL_DAYS),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            super_admin_email: SUPER_ADMIN_EMAIL.to_string(),
            default_prompt_limit: DEFAULT_PROMPT_LIMIT,
            trial_days: DEFAULT_TRIAL_DAYS,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("GCP_PROJECT_ID", "test-project");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.gcp_project_id, "test-project");
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_prompt_limit, DEFAULT_PROMPT_LIMIT);
    }

    #[test]
    fn test_super_admin_default() {
        let config = Config::test_default();
        assert_eq!(config.super_admin_email, SUPER_ADMIN_EMAIL);
    }
}
