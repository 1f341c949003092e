//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MYCO_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//! - `MYCO_BASE_URL` - Public URL for the site
//!
//! ## Optional
//! - `MYCO_HOST` - Bind address (default: 127.0.0.1)
//! - `MYCO_PORT` - Listen port (default: 3000)
//! - `MYCO_DEFAULT_LOCALE` - Fallback locale (default: en)
//! - `MYCO_LOCALES` - Comma-separated supported locales (default: en,fr,pt,es,de)
//! - `MYCO_ROBOT_ALLOWLIST` - Comma-separated user-agent fragments of welcome crawlers
//! - `MYCO_ONTOLOGY_URL` - Base URL of the remote ontology service
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` -
//!   outgoing mail; all of host, username, password and from are needed to enable it
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use mycoflora_core::Locale;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Crawlers allowed to read robot-friendly pages when no allowlist is configured.
pub const DEFAULT_ROBOT_ALLOWLIST: &[&str] = &[
    "googlebot",
    "bingbot",
    "duckduckbot",
    "applebot",
    "yandexbot",
];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Locale settings
    pub i18n: I18nConfig,
    /// User-agent fragments of crawlers allowed on robot-friendly pages
    pub robot_allowlist: Vec<String>,
    /// Remote ontology service base URL
    pub ontology_url: Option<Url>,
    /// Outgoing mail; `None` disables delivery (emails stay queued)
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Supported locales and the fallback.
#[derive(Debug, Clone)]
pub struct I18nConfig {
    /// Locale used when no request source yields a supported one
    pub default_locale: Locale,
    /// Locales the site will switch to
    pub supported: Vec<Locale>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        let supported: Vec<Locale> = ["en", "fr", "pt", "es", "de"]
            .iter()
            .filter_map(|code| Locale::parse(code).ok())
            .collect();
        Self {
            default_locale: Locale::default(),
            supported,
        }
    }
}

/// SMTP configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the SMTP password fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MYCO_DATABASE_URL")?;
        let host = get_env_or_default("MYCO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MYCO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MYCO_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MYCO_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("MYCO_BASE_URL")?;

        let i18n = I18nConfig::from_env()?;
        let robot_allowlist = get_optional_env("MYCO_ROBOT_ALLOWLIST").map_or_else(
            || {
                DEFAULT_ROBOT_ALLOWLIST
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            },
            |raw| split_list(&raw).map(str::to_lowercase).collect(),
        );
        let ontology_url = get_optional_env("MYCO_ONTOLOGY_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("MYCO_ONTOLOGY_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let email = EmailConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            i18n,
            robot_allowlist,
            ontology_url,
            email,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl I18nConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let supported = match get_optional_env("MYCO_LOCALES") {
            Some(raw) => split_list(&raw)
                .map(|code| {
                    Locale::parse(code).map_err(|e| {
                        ConfigError::InvalidEnvVar("MYCO_LOCALES".to_string(), e.to_string())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.supported,
        };

        let default_locale = match get_optional_env("MYCO_DEFAULT_LOCALE") {
            Some(raw) => Locale::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("MYCO_DEFAULT_LOCALE".to_string(), e.to_string())
            })?,
            None => defaults.default_locale,
        };

        if !supported.contains(&default_locale) {
            return Err(ConfigError::InvalidEnvVar(
                "MYCO_DEFAULT_LOCALE".to_string(),
                format!("{default_locale} is not listed in MYCO_LOCALES"),
            ));
        }

        Ok(Self {
            default_locale,
            supported,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_validated_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated list, dropping blanks.
fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("changeme-smtp", "SMTP_PASSWORD").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "SMTP_PASSWORD").is_err());
        assert!(validate_secret_strength("q7#Vz2!mLp9@Rk4$", "SMTP_PASSWORD").is_ok());
    }

    #[test]
    fn test_split_list_trims_and_skips_blanks() {
        let items: Vec<&str> = split_list(" en, fr ,,pt ").collect();
        assert_eq!(items, vec!["en", "fr", "pt"]);
    }

    #[test]
    fn test_default_i18n_config() {
        let config = I18nConfig::default();
        assert_eq!(config.default_locale.as_str(), "en");
        assert_eq!(config.supported.len(), 5);
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.net".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("hunter2-but-longer"),
            from_address: "news@mycoflora.org".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.example.net"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
