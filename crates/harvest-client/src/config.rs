//! # Client Configuration
//!
//! Configuration for the request dispatcher and the mock backend.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HARVEST_API_MODE=live_with_fallback                                │
//! │     HARVEST_API_BASE_URL=http://localhost:8080                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/harvesthub/storefront.toml (Linux)                       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     DispatchMode::Mock, 15s request timeout                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [api]
//! base_url = "http://localhost:8080"
//! mode = "live_with_fallback"   # mock | live | live_with_fallback
//! request_timeout_secs = 15
//!
//! [mock]
//! latency_ms = 300
//! payment_success_rate = 0.95
//! seed = 42
//!
//! [store]
//! currency = "INR"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Dispatch Mode
// =============================================================================

/// Where the dispatcher sends each call.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Dispatch Mode Behavior                            │
/// │                                                                         │
/// │  MOCK (Default)                                                        │
/// │  • Every call is answered by the in-memory simulator                   │
/// │                                                                         │
/// │  LIVE                                                                  │
/// │  • Every call goes to the HTTP backend; failures surface as-is         │
/// │                                                                         │
/// │  LIVE_WITH_FALLBACK                                                    │
/// │  • HTTP first; a call that got NO response is re-sent to the mock      │
/// │  • Error statuses and timeouts are never re-sent                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    #[default]
    Mock,
    Live,
    LiveWithFallback,
}

impl DispatchMode {
    /// Returns true if calls are sent to the HTTP backend first.
    pub fn uses_live_backend(&self) -> bool {
        !matches!(self, DispatchMode::Mock)
    }

    /// Returns true if connection failures are re-sent to the mock.
    pub fn falls_back_to_mock(&self) -> bool {
        matches!(self, DispatchMode::LiveWithFallback)
    }
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchMode::Mock => write!(f, "mock"),
            DispatchMode::Live => write!(f, "live"),
            DispatchMode::LiveWithFallback => write!(f, "live_with_fallback"),
        }
    }
}

impl std::str::FromStr for DispatchMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(DispatchMode::Mock),
            "live" | "real" => Ok(DispatchMode::Live),
            "live_with_fallback" | "fallback" => Ok(DispatchMode::LiveWithFallback),
            other => Err(ClientError::InvalidConfig(format!(
                "Unknown dispatch mode: '{}'. Valid options: mock, live, live_with_fallback",
                other
            ))),
        }
    }
}

// =============================================================================
// API Settings
// =============================================================================

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the marketplace backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub mode: DispatchMode,

    /// Upper bound on a single HTTP call (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            mode: DispatchMode::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Mock Settings
// =============================================================================

/// Simulator behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockSettings {
    /// Latency for catalogue, order and maps calls (milliseconds).
    #[serde(default = "default_latency")]
    pub latency_ms: u64,

    #[serde(default = "default_auth_latency")]
    pub auth_latency_ms: u64,

    /// Latency for payment-order creation.
    #[serde(default = "default_payment_latency")]
    pub payment_latency_ms: u64,

    /// Latency for the payment processor itself.
    #[serde(default = "default_payment_processing")]
    pub payment_processing_ms: u64,

    /// Probability that the mock processor approves a payment.
    #[serde(default = "default_success_rate")]
    pub payment_success_rate: f64,

    /// Seed for the processor's random source. Unseeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// HS256 secret for mock tokens.
    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    /// HMAC key for mock payment signatures.
    #[serde(default = "default_payment_key_secret")]
    pub payment_key_secret: String,
}

fn default_latency() -> u64 {
    300
}
fn default_auth_latency() -> u64 {
    500
}
fn default_payment_latency() -> u64 {
    500
}
fn default_payment_processing() -> u64 {
    1000
}
fn default_success_rate() -> f64 {
    0.95
}
fn default_token_secret() -> String {
    "harvesthub-mock-token-secret".to_string()
}
fn default_payment_key_secret() -> String {
    "harvesthub-mock-payment-secret".to_string()
}

impl Default for MockSettings {
    fn default() -> Self {
        MockSettings {
            latency_ms: default_latency(),
            auth_latency_ms: default_auth_latency(),
            payment_latency_ms: default_payment_latency(),
            payment_processing_ms: default_payment_processing(),
            payment_success_rate: default_success_rate(),
            seed: None,
            token_secret: default_token_secret(),
            payment_key_secret: default_payment_key_secret(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// ISO currency code sent with payment orders.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    harvest_core::DEFAULT_CURRENCY.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            currency: default_currency(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete storefront client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub mock: MockSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api.mode.uses_live_backend() {
            let url = url::Url::parse(&self.api.base_url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ClientError::InvalidUrl(format!(
                    "Base URL must start with http:// or https://, got: {}",
                    self.api.base_url
                )));
            }
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        let rate = self.mock.payment_success_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ClientError::InvalidConfig(format!(
                "payment_success_rate must be within [0, 1], got: {}",
                rate
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("HARVEST_API_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(mode) = std::env::var("HARVEST_API_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding dispatch mode from environment");
                    self.api.mode = parsed;
                }
                Err(e) => warn!(mode = %mode, error = %e, "Ignoring dispatch mode from environment"),
            }
        }

        if let Ok(timeout) = std::env::var("HARVEST_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.api.request_timeout_secs = secs;
            }
        }

        if let Ok(seed) = std::env::var("HARVEST_MOCK_SEED") {
            if let Ok(seed) = seed.parse::<u64>() {
                debug!(seed, "Seeding mock payment processor from environment");
                self.mock.seed = Some(seed);
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "harvesthub", "storefront")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn mode(&self) -> DispatchMode {
        self.api.mode
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn currency(&self) -> &str {
        &self.store.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_mode_parsing() {
        assert_eq!("mock".parse::<DispatchMode>().unwrap(), DispatchMode::Mock);
        assert_eq!("LIVE".parse::<DispatchMode>().unwrap(), DispatchMode::Live);
        assert_eq!("real".parse::<DispatchMode>().unwrap(), DispatchMode::Live);
        assert_eq!(
            "fallback".parse::<DispatchMode>().unwrap(),
            DispatchMode::LiveWithFallback
        );
        assert!("offline".parse::<DispatchMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.mode(), DispatchMode::Mock);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.mock.payment_success_rate, 0.95);
        assert_eq!(config.currency(), "INR");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        // Base URL is only checked when the live backend is used
        config.api.base_url = "ws://localhost:9000".to_string();
        assert!(config.validate().is_ok());
        config.api.mode = DispatchMode::Live;
        assert!(config.validate().is_err());

        config.api.base_url = "https://api.harvesthub.example".to_string();
        assert!(config.validate().is_ok());

        config.api.request_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.api.request_timeout_secs = 10;

        config.mock.payment_success_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            mode = "live_with_fallback"

            [mock]
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.mode(), DispatchMode::LiveWithFallback);
        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.mock.seed, Some(7));
        assert_eq!(config.mock.latency_ms, 300);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    const ENV_VARS: [&str; 4] = [
        "HARVEST_API_BASE_URL",
        "HARVEST_API_MODE",
        "HARVEST_REQUEST_TIMEOUT_SECS",
        "HARVEST_MOCK_SEED",
    ];

    /// Process environment is shared between test threads.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Holds the env lock and clears the overrides before and after a test.
    struct EnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn acquire() -> Self {
            let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
            EnvGuard { _lock: guard }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
        }
    }

    fn write_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("storefront-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const LIVE_FILE: &str = r#"
        [api]
        base_url = "http://127.0.0.1:9000/backend"
        mode = "live"
        request_timeout_secs = 5

        [mock]
        seed = 3
    "#;

    #[test]
    fn test_load_reads_file() {
        let _env = EnvGuard::acquire();
        let path = write_config(LIVE_FILE);

        let config = ClientConfig::load(Some(path.clone())).unwrap();
        assert_eq!(config.mode(), DispatchMode::Live);
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/backend");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.mock.seed, Some(3));
        assert_eq!(config.mock.latency_ms, 300);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let _env = EnvGuard::acquire();
        let path = write_config(LIVE_FILE);
        std::env::set_var("HARVEST_API_MODE", "fallback");
        std::env::set_var("HARVEST_MOCK_SEED", "99");
        std::env::set_var("HARVEST_REQUEST_TIMEOUT_SECS", "30");

        let config = ClientConfig::load(Some(path.clone())).unwrap();
        assert_eq!(config.mode(), DispatchMode::LiveWithFallback);
        assert_eq!(config.mock.seed, Some(99));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        // Not overridden
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/backend");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_env_override_is_validated() {
        let _env = EnvGuard::acquire();
        let path = write_config(LIVE_FILE);
        std::env::set_var("HARVEST_API_BASE_URL", "ftp://files.example");

        let err = ClientConfig::load(Some(path.clone())).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let _env = EnvGuard::acquire();

        let out_of_range = write_config("[mock]\npayment_success_rate = 2.0\n");
        let err = ClientConfig::load(Some(out_of_range.clone())).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));

        let malformed = write_config("[api\nmode = ");
        let err = ClientConfig::load(Some(malformed.clone())).unwrap_err();
        assert!(matches!(err, ClientError::ConfigLoadFailed(_)));

        std::fs::remove_file(out_of_range).ok();
        std::fs::remove_file(malformed).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _env = EnvGuard::acquire();
        let path = std::env::temp_dir().join(format!("absent-{}.toml", uuid::Uuid::new_v4()));

        let config = ClientConfig::load(Some(path)).unwrap();
        assert_eq!(config.mode(), DispatchMode::Mock);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }
}
