//! # Guard Configuration
//!
//! Sweep interval and rate-limit policy overrides.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_SWEEP_INTERVAL_SECS=300                                 │
//! │     STOREFRONT_DEFAULT_MAX_REQUESTS=60                                 │
//! │     STOREFRONT_DEFAULT_WINDOW_MS=60000                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/guard.toml (Linux)                            │
//! │                                                                         │
//! │  3. Built-in policy table (lowest priority)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The limits themselves are a static table in [`crate::policy`]; this file
//! and these variables are an optional operator layer on top of it. Neither
//! is required. With no file and no `STOREFRONT_*` variables the limiter runs
//! exactly the built-in table with a 300 s sweep, and a file that fails to
//! load or validate falls back to the same (see [`GuardConfig::load_or_default`]).
//!
//! ## Configuration File Format
//! ```toml
//! # guard.toml
//! [sweeper]
//! interval_secs = 300
//!
//! [default_policy]
//! max_requests = 60
//! window_ms = 60000
//!
//! # Overrides or additions to the built-in per-endpoint table
//! [endpoints.search]
//! max_requests = 50
//! window_ms = 60000
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GuardError, GuardResult};
use crate::policy::{PolicyTable, RateLimitPolicy, DEFAULT_POLICY, MAX_WINDOW_MS};

/// How often expired windows are purged.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Sweeper Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweeperSettings {
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for SweeperSettings {
    fn default() -> Self {
        SweeperSettings {
            interval_secs: default_sweep_interval(),
        }
    }
}

// =============================================================================
// Guard Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub sweeper: SweeperSettings,

    /// Policy for endpoints not in the table.
    #[serde(default = "default_policy")]
    pub default_policy: RateLimitPolicy,

    /// Per-endpoint entries layered over the built-in table.
    #[serde(default)]
    pub endpoints: BTreeMap<String, RateLimitPolicy>,
}

fn default_policy() -> RateLimitPolicy {
    DEFAULT_POLICY
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            sweeper: SweeperSettings::default(),
            default_policy: default_policy(),
            endpoints: BTreeMap::new(),
        }
    }
}

impl GuardConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (guard.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> GuardResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading guard config from file");
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

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load guard config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> GuardResult<()> {
        if self.sweeper.interval_secs == 0 {
            return Err(GuardError::InvalidConfig(
                "sweeper.interval_secs must be greater than 0".into(),
            ));
        }

        validate_policy("default_policy", &self.default_policy)?;
        for (endpoint, policy) in &self.endpoints {
            validate_policy(&format!("endpoints.{}", endpoint), policy)?;
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup. Unparseable values are
    /// ignored with a warning.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("STOREFRONT_SWEEP_INTERVAL_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => {
                    debug!(secs, "Overriding sweep interval from environment");
                    self.sweeper.interval_secs = secs;
                }
                Err(_) => warn!(value = %value, "Invalid STOREFRONT_SWEEP_INTERVAL_SECS"),
            }
        }

        if let Some(value) = var("STOREFRONT_DEFAULT_MAX_REQUESTS") {
            match value.parse::<u32>() {
                Ok(max) => {
                    debug!(max, "Overriding default max requests from environment");
                    self.default_policy.max_requests = max;
                }
                Err(_) => warn!(value = %value, "Invalid STOREFRONT_DEFAULT_MAX_REQUESTS"),
            }
        }

        if let Some(value) = var("STOREFRONT_DEFAULT_WINDOW_MS") {
            match value.parse::<u64>() {
                Ok(ms) => {
                    debug!(ms, "Overriding default window from environment");
                    self.default_policy.window_ms = ms;
                }
                Err(_) => warn!(value = %value, "Invalid STOREFRONT_DEFAULT_WINDOW_MS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "storefront")
            .map(|dirs| dirs.config_dir().join("guard.toml"))
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// The built-in table with this config's default and endpoint entries
    /// applied on top.
    pub fn policy_table(&self) -> PolicyTable {
        self.endpoints.iter().fold(
            PolicyTable::default().with_default(self.default_policy),
            |table, (endpoint, policy)| table.with_endpoint(endpoint.clone(), *policy),
        )
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweeper.interval_secs)
    }
}

fn validate_policy(name: &str, policy: &RateLimitPolicy) -> GuardResult<()> {
    if policy.max_requests == 0 {
        return Err(GuardError::InvalidConfig(format!(
            "{}.max_requests must be greater than 0",
            name
        )));
    }

    if policy.window_ms == 0 || policy.window_ms > MAX_WINDOW_MS {
        return Err(GuardError::InvalidConfig(format!(
            "{}.window_ms must be between 1 and {}",
            name, MAX_WINDOW_MS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_builtin_table() {
        let config = GuardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.policy_table(), PolicyTable::default());
    }

    #[test]
    fn test_missing_file_runs_builtin_table() {
        let path = std::env::temp_dir().join(format!(
            "storefront-guard-absent-{}.toml",
            std::process::id()
        ));

        let config = GuardConfig::load(Some(path)).unwrap();

        assert_eq!(config.policy_table(), PolicyTable::default());
        assert_eq!(config.sweep_interval(), Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS));
    }

    #[test]
    fn test_parse_toml() {
        let config: GuardConfig = toml::from_str(
            r#"
            [sweeper]
            interval_secs = 60

            [endpoints.search]
            max_requests = 50
            window_ms = 30000

            [endpoints.reviews]
            max_requests = 3
            window_ms = 60000
            "#,
        )
        .unwrap();

        assert_eq!(config.sweeper.interval_secs, 60);
        assert_eq!(config.default_policy, DEFAULT_POLICY);

        let table = config.policy_table();
        assert_eq!(table.policy_for("search"), RateLimitPolicy::new(50, 30_000));
        assert_eq!(table.policy_for("reviews"), RateLimitPolicy::new(3, 60_000));
        assert_eq!(table.policy_for("contact"), RateLimitPolicy::new(5, 3_600_000));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: GuardConfig = toml::from_str("").unwrap();
        assert_eq!(config, GuardConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = GuardConfig::default();
        config.sweeper.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = GuardConfig::default();
        config.default_policy.window_ms = 0;
        assert!(config.validate().is_err());

        let mut config = GuardConfig::default();
        config
            .endpoints
            .insert("search".into(), RateLimitPolicy::new(0, 1_000));
        assert!(matches!(config.validate(), Err(GuardError::InvalidConfig(msg)) if msg.contains("endpoints.search")));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOREFRONT_SWEEP_INTERVAL_SECS", "120"),
            ("STOREFRONT_DEFAULT_MAX_REQUESTS", "not-a-number"),
            ("STOREFRONT_DEFAULT_WINDOW_MS", "30000"),
        ]
        .into_iter()
        .collect();

        let mut config = GuardConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.sweeper.interval_secs, 120);
        assert_eq!(config.default_policy, RateLimitPolicy::new(60, 30_000));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "storefront-guard-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[default_policy]\nmax_requests = 10\nwindow_ms = 1000\n").unwrap();

        let config = GuardConfig::load(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.policy_table().policy_for("checkout").max_requests, 10);
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let path = std::env::temp_dir().join(format!(
            "storefront-guard-bad-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[sweeper]\ninterval_secs = 0\n").unwrap();

        let config = GuardConfig::load_or_default(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        assert_eq!(config.sweeper.interval_secs, DEFAULT_SWEEP_INTERVAL_SECS);
    }
}
