//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PLANTTAXA_API_URL` - Backend API base URL (default: `http://localhost:5000/api`)
//! - `PLANTTAXA_DATA_DIR` - Directory for the session token and saved cart (default: `.planttaxa`)
//! - `PLANTTAXA_HTTP_TIMEOUT_SECS` - Transport timeout for backend calls (default: 30)
//! - `PLANTTAXA_CATALOG_TTL_SECS` - How long the plant catalog is cached (default: 300)
//! - `PLANTTAXA_ZERO_QUANTITY` - `clamp` or `remove` (default: `clamp`)
//! - `PLANTTAXA_PERSIST_CART` - Mirror the cart to disk (default: true)

use std::path::PathBuf;
use std::time::Duration;

use planttaxa_core::ZeroQuantityPolicy;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_DATA_DIR: &str = ".planttaxa";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Backend API base URL, always ending in `/`
    pub api_url: Url,
    /// Directory for the file-backed key-value store
    pub data_dir: PathBuf,
    /// Timeout applied by the HTTP transport
    pub http_timeout: Duration,
    /// Catalog cache time-to-live
    pub catalog_ttl: Duration,
    /// What a zero quantity update does
    pub zero_quantity: ZeroQuantityPolicy,
    /// Whether the cart is mirrored to storage
    pub persist_cart: bool,
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(&env_or_default(&lookup, "PLANTTAXA_API_URL", DEFAULT_API_URL))?;
        let data_dir = PathBuf::from(env_or_default(&lookup, "PLANTTAXA_DATA_DIR", DEFAULT_DATA_DIR));
        let http_timeout = Duration::from_secs(parse_secs(
            &lookup,
            "PLANTTAXA_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let catalog_ttl = Duration::from_secs(parse_secs(
            &lookup,
            "PLANTTAXA_CATALOG_TTL_SECS",
            DEFAULT_CATALOG_TTL_SECS,
        )?);
        let zero_quantity = env_or_default(&lookup, "PLANTTAXA_ZERO_QUANTITY", "clamp")
            .parse::<ZeroQuantityPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("PLANTTAXA_ZERO_QUANTITY".to_string(), e))?;
        let persist_cart = parse_bool(&lookup, "PLANTTAXA_PERSIST_CART", true)?;

        Ok(Self {
            api_url,
            data_dir,
            http_timeout,
            catalog_ttl,
            zero_quantity,
            persist_cart,
        })
    }

    /// Resolve an endpoint path (e.g. `auth/login`) against the API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.api_url.join(path.trim_start_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn env_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse the API base URL, requiring http(s) and a trailing slash so that
/// relative joins keep the `/api` prefix.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("PLANTTAXA_API_URL".to_string(), msg);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    lookup(key).map_or(Ok(default), |raw| {
        raw.parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ShopConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ShopConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:5000/api/");
        assert_eq!(config.data_dir, PathBuf::from(".planttaxa"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_ttl, Duration::from_secs(300));
        assert_eq!(config.zero_quantity, ZeroQuantityPolicy::Clamp);
        assert!(config.persist_cart);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PLANTTAXA_API_URL", "https://api.planttaxa.app/v1"),
            ("PLANTTAXA_DATA_DIR", "/tmp/pt"),
            ("PLANTTAXA_HTTP_TIMEOUT_SECS", "5"),
            ("PLANTTAXA_CATALOG_TTL_SECS", "0"),
            ("PLANTTAXA_ZERO_QUANTITY", "remove"),
            ("PLANTTAXA_PERSIST_CART", "false"),
        ])
        .unwrap();

        assert_eq!(config.api_url.as_str(), "https://api.planttaxa.app/v1/");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pt"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.catalog_ttl, Duration::ZERO);
        assert_eq!(config.zero_quantity, ZeroQuantityPolicy::Remove);
        assert!(!config.persist_cart);
    }

    #[test]
    fn test_endpoint_keeps_api_prefix() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.endpoint("auth/login").unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );
        assert_eq!(
            config.endpoint("/orders").unwrap().as_str(),
            "http://localhost:5000/api/orders"
        );
    }

    #[test]
    fn test_invalid_url_scheme() {
        let err = config_from(&[("PLANTTAXA_API_URL", "ftp://example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PLANTTAXA_API_URL"));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = config_from(&[("PLANTTAXA_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_zero_quantity_policy() {
        assert!(config_from(&[("PLANTTAXA_ZERO_QUANTITY", "ignore")]).is_err());
    }

    #[test]
    fn test_invalid_bool() {
        assert!(config_from(&[("PLANTTAXA_PERSIST_CART", "maybe")]).is_err());
        assert!(config_from(&[("PLANTTAXA_PERSIST_CART", "YES")]).unwrap().persist_cart);
    }
}
