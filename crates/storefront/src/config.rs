//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CASEMANDU_API_URL` - External API base URL (default: `https://casemandu-api.casemandu.com.np`)
//! - `CASEMANDU_STOREFRONT_URL` - Public storefront URL used for order links (default: `https://casemandu.com.np`)
//! - `CASEMANDU_STATE_DIR` - Directory holding the persisted cart (default: `.casemandu`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Fallback API host when `CASEMANDU_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://casemandu-api.casemandu.com.np";

/// Fallback storefront host when `CASEMANDU_STOREFRONT_URL` is unset.
pub const DEFAULT_STOREFRONT_URL: &str = "https://casemandu.com.np";

const DEFAULT_STATE_DIR: &str = ".casemandu";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// External API base URL, without a trailing slash
    pub api_base_url: String,
    /// Public storefront URL, without a trailing slash
    pub storefront_url: String,
    /// Where the cart is persisted between runs
    pub state_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            storefront_url: DEFAULT_STOREFRONT_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a URL variable is set but is not an absolute
    /// `http(s)` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = validate_base_url(
            "CASEMANDU_API_URL",
            &get_env_or_default("CASEMANDU_API_URL", DEFAULT_API_URL),
        )?;
        let storefront_url = validate_base_url(
            "CASEMANDU_STOREFRONT_URL",
            &get_env_or_default("CASEMANDU_STOREFRONT_URL", DEFAULT_STOREFRONT_URL),
        )?;
        let state_dir = PathBuf::from(get_env_or_default("CASEMANDU_STATE_DIR", DEFAULT_STATE_DIR));

        Ok(Self {
            api_base_url,
            storefront_url,
            state_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Check that `value` is an absolute `http(s)` URL and strip trailing slashes.
fn validate_base_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(value.trim().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_trims_trailing_slash() {
        let url = validate_base_url("TEST_VAR", "http://localhost:5000/").unwrap();
        assert_eq!(url, "http://localhost:5000");
    }

    #[test]
    fn test_validate_base_url_keeps_path() {
        let url = validate_base_url("TEST_VAR", "https://example.com/shop//").unwrap();
        assert_eq!(url, "https://example.com/shop");
    }

    #[test]
    fn test_validate_base_url_rejects_relative() {
        let err = validate_base_url("TEST_VAR", "/api").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref name, _) if name == "TEST_VAR"));
    }

    #[test]
    fn test_validate_base_url_rejects_other_schemes() {
        assert!(validate_base_url("TEST_VAR", "ftp://example.com").is_err());
        assert!(validate_base_url("TEST_VAR", "mailto:dev@example.com").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.state_dir, PathBuf::from(".casemandu"));
        assert!(config.sentry_dsn.is_none());
    }
}
