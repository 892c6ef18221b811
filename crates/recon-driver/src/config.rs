//! Driver and application configuration
//!
//! `AppConfig` is read from TOML and then overridden from the environment:
//!
//! ```toml
//! table_name = "users"
//! driver = "workflow"
//!
//! [source]
//! api_url = "https://users.example.com/prod/users"
//! timeout_secs = 10
//!
//! [engine]
//! max_conflict_retries = 3
//!
//! [engine.retry]
//! max_attempts = 3
//! initial_backoff_ms = 50
//! ```

use crate::error::ReconError;
use recon_store::{HttpUserSource, SourceConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding `source.api_url`
pub const ENV_API_URL: &str = "RECON_API_URL";
/// Environment variable overriding `table_name`
pub const ENV_TABLE_NAME: &str = "RECON_TABLE_NAME";

/// Bounded exponential backoff for idempotent collaborator calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first; `1` disables retries
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failure
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Growth factor between consecutive delays
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` and default delays
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Single attempt, no retries
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(1)
    }

    /// With initial backoff
    #[inline]
    #[must_use]
    pub fn with_initial_backoff(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    /// With max backoff
    #[inline]
    #[must_use]
    pub fn with_max_backoff(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    /// Attempts actually allowed (never below one)
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        if base.is_nan() {
            return Duration::ZERO;
        }
        let capped = base.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Driver tuning shared by both realizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Retry policy for source lookups, store reads and merges
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Storage conflicts re-resolved before giving up
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Workflow state transitions allowed per execution; restarts on every
    /// conflict re-entry
    #[serde(default = "default_max_transitions")]
    pub max_transitions: u32,
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_max_transitions() -> u32 {
    32
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_conflict_retries: default_max_conflict_retries(),
            max_transitions: default_max_transitions(),
        }
    }
}

impl DriverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With conflict budget
    #[inline]
    #[must_use]
    pub fn with_max_conflict_retries(mut self, max: u32) -> Self {
        self.max_conflict_retries = max;
        self
    }

    /// With workflow transition limit
    #[inline]
    #[must_use]
    pub fn with_max_transitions(mut self, max: u32) -> Self {
        self.max_transitions = max;
        self
    }
}

/// Which driver realization to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Imperative step sequence
    #[default]
    Sequential,
    /// Declarative state machine
    Workflow,
}

impl DriverKind {
    /// Every realization
    pub const ALL: [DriverKind; 2] = [DriverKind::Sequential, DriverKind::Workflow];

    /// Config and CLI spelling
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Sequential => "sequential",
            DriverKind::Workflow => "workflow",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(DriverKind::Sequential),
            "workflow" => Ok(DriverKind::Workflow),
            other => Err(ReconError::Config(format!(
                "unknown driver '{other}', expected 'sequential' or 'workflow'"
            ))),
        }
    }
}

/// Process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Store namespace, reported in logs
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Driver realization
    #[serde(default)]
    pub driver: DriverKind,
    /// External source adapter
    #[serde(default)]
    pub source: SourceConfig,
    /// Driver tuning
    #[serde(default)]
    pub engine: DriverConfig,
}

fn default_table_name() -> String {
    "users".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            driver: DriverKind::default(),
            source: SourceConfig::default(),
            engine: DriverConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// `ReconError::Config` on malformed TOML.
    pub fn from_toml(text: &str) -> Result<Self, ReconError> {
        toml::from_str(text).map_err(|e| ReconError::Config(format!("invalid config: {e}")))
    }

    /// Load from `path` (defaults when `None`), then apply the process environment
    ///
    /// # Errors
    /// `ReconError::Config` if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ReconError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ReconError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from `lookup` (the environment in production)
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.source.api_url = url;
        }
        if let Some(table) = lookup(ENV_TABLE_NAME).filter(|v| !v.is_empty()) {
            self.table_name = table;
        }
        self
    }

    /// Build the HTTP source
    ///
    /// # Errors
    /// `ReconError::Config` if `api_url` is missing or unusable.
    pub fn http_source(&self) -> Result<HttpUserSource, ReconError> {
        if self.source.api_url.is_empty() {
            return Err(ReconError::Config(format!(
                "missing external source URL: set source.api_url or {ENV_API_URL}"
            )));
        }
        HttpUserSource::new(&self.source).map_err(|e| ReconError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::new(5).with_initial_backoff(100).with_max_backoff(250);
        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(250));
        assert_eq!(policy.backoff(40), Duration::from_millis(250));
    }

    #[test]
    fn nonsense_multiplier_yields_no_delay() {
        let policy = RetryPolicy {
            multiplier: f64::NAN,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(2), Duration::ZERO);
        assert_eq!(RetryPolicy::new(0).attempts(), 1);
    }

    #[test]
    fn toml_with_defaults() {
        let config = AppConfig::from_toml(
            r#"
            driver = "workflow"

            [source]
            api_url = "http://localhost:8080/users"

            [engine.retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.driver, DriverKind::Workflow);
        assert_eq!(config.table_name, "users");
        assert_eq!(config.source.timeout_secs, 10);
        assert_eq!(config.engine.retry.max_attempts, 5);
        assert_eq!(config.engine.retry.initial_backoff_ms, 50);
        assert_eq!(config.engine.max_conflict_retries, 3);
        assert_eq!(config.engine.max_transitions, 32);
    }

    #[test]
    fn environment_overrides_file() {
        let config = AppConfig::default().with_env(|key| match key {
            ENV_API_URL => Some("http://upstream/users".to_string()),
            ENV_TABLE_NAME => Some("users-staging".to_string()),
            _ => None,
        });
        assert_eq!(config.source.api_url, "http://upstream/users");
        assert_eq!(config.table_name, "users-staging");
    }

    #[test]
    fn missing_api_url_is_config_error() {
        let err = AppConfig::default().http_source().unwrap_err();
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains(ENV_API_URL));
    }

    #[test]
    fn driver_kind_parsing() {
        assert_eq!("workflow".parse::<DriverKind>().unwrap(), DriverKind::Workflow);
        assert!("step-function".parse::<DriverKind>().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recon.toml");
        std::fs::write(&path, "table_name = \"people\"\n").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let config = AppConfig::from_toml(&text).unwrap().with_env(|_| None);
        assert_eq!(config.table_name, "people");
        assert!(AppConfig::load(Some(&path)).is_ok());
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
