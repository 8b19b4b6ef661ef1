// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; there is no runtime reload.

use std::env;
use std::time::Duration;

/// Error codes that put the session into Demo Mode when sign-in fails.
///
/// These are configuration-class failures (bad API key, domain not
/// authorized, provider internal error) as opposed to ordinary auth or
/// network failures. Overridable via `DEMO_TRIGGER_CODES`.
pub const DEFAULT_DEMO_TRIGGER_CODES: &[&str] = &[
    "auth/api-key-not-valid",
    "auth/internal-error",
    "auth/unauthorized-domain",
];

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Identity Toolkit API key (public, but environment-specific)
    pub google_api_key: String,
    /// Operator account used for the interactive sign-in flow
    pub operator_email: String,
    /// Operator account password
    pub operator_password: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Frontend URL for CORS and invite links
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Provider error codes that trigger Demo Mode entry
    pub demo_trigger_codes: Vec<String>,
    /// Upper bound on the initial identity resolution before `loading`
    /// is forced to false
    pub auth_resolve_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            google_api_key: env::var("GOOGLE_API_KEY")
                .map_err(|_| ConfigError::Missing("GOOGLE_API_KEY"))?,
            operator_email: env::var("OPERATOR_EMAIL")
                .map_err(|_| ConfigError::Missing("OPERATOR_EMAIL"))?,
            operator_password: env::var("OPERATOR_PASSWORD")
                .map_err(|_| ConfigError::Missing("OPERATOR_PASSWORD"))?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            demo_trigger_codes: env::var("DEMO_TRIGGER_CODES")
                .map(|v| parse_code_list(&v))
                .unwrap_or_else(|_| default_demo_codes()),
            auth_resolve_timeout: Duration::from_secs(
                env::var("AUTH_RESOLVE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            google_api_key: "test_api_key".to_string(),
            operator_email: "operator@example.com".to_string(),
            operator_password: "test_password".to_string(),
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            demo_trigger_codes: default_demo_codes(),
            auth_resolve_timeout: Duration::from_secs(2),
        }
    }
}

fn default_demo_codes() -> Vec<String> {
    DEFAULT_DEMO_TRIGGER_CODES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn parse_code_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
