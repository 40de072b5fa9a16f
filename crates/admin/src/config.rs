//! Panel client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RP_API_URL` - Base URL of the panel REST API
//!
//! ## Optional
//! - `RP_LOGIN_URL` - Where "redirect to login" navigates (default: login.html)
//! - `RP_VERIFICATION_POLICY` - `always_revalidate` or `trust_cached_role`
//!   (default: `always_revalidate`)
//! - `RP_REQUEST_TIMEOUT_SECS` - HTTP and admin re-validation timeout (default: 10)
//! - `RP_VERIFY_ON_STARTUP` - Re-check a persisted token when the session
//!   store hydrates (default: true)
//! - `RP_SESSION_FILE` - File-backed session record used by the CLI
//!   (default: .rp-session.json)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::guard::VerificationPolicy;

const DEFAULT_LOGIN_URL: &str = "login.html";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_FILE: &str = ".rp-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Panel client configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Base URL of the panel API (always ends with `/`)
    pub api_url: Url,
    /// Login view URL used for redirects
    pub login_url: String,
    /// How the admin guard confirms the cached role
    pub verification_policy: VerificationPolicy,
    /// Timeout for API requests and admin re-validation
    pub request_timeout: Duration,
    /// Re-check a persisted token during session hydration
    pub verify_on_startup: bool,
    /// Path of the file-backed session record
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

impl PanelConfig {
    /// Configuration with defaults for everything except the API URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            verification_policy: VerificationPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            verify_on_startup: true,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("RP_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("RP_API_URL".to_string()))?;
        let api_url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigError::InvalidEnvVar("RP_API_URL".to_string(), e.to_string()))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "RP_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let mut config = Self::new(api_url);

        if let Some(login_url) = lookup("RP_LOGIN_URL").filter(|v| !v.trim().is_empty()) {
            config.login_url = login_url;
        }
        if let Some(policy) = lookup("RP_VERIFICATION_POLICY") {
            config.verification_policy = policy.parse().map_err(|e: String| {
                ConfigError::InvalidEnvVar("RP_VERIFICATION_POLICY".to_string(), e)
            })?;
        }
        if let Some(secs) = lookup("RP_REQUEST_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("RP_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar(
                    "RP_REQUEST_TIMEOUT_SECS".to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = lookup("RP_VERIFY_ON_STARTUP") {
            config.verify_on_startup = parse_bool(&flag).ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "RP_VERIFY_ON_STARTUP".to_string(),
                    format!("expected true/false, got '{flag}'"),
                )
            })?;
        }
        if let Some(path) = lookup("RP_SESSION_FILE").filter(|v| !v.trim().is_empty()) {
            config.session_file = PathBuf::from(path);
        }
        config.sentry_dsn = lookup("SENTRY_DSN").filter(|v| !v.is_empty());
        config.sentry_environment = lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty());

        Ok(config)
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
