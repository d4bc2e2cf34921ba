//! Configuration for the decay janitor
//!
//! The binary reads one TOML file with a section per component:
//!
//! ```toml
//! [janitor]
//! sweep_interval_minutes = 60
//! days_per_sweep = 1.0
//! dry_run = false
//!
//! [database]
//! path = "rumormill.db"
//!
//! [llm]
//! provider = "ollama"
//! model = "llama3"
//!
//! [service]
//! expiry_threshold = 0.1
//!
//! [transformer]
//! generation_timeout_secs = 30
//! ```

use crate::JanitorError;
use rumormill_service::ServiceConfig;
use rumormill_transformer::TransformerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How often and how hard the janitor decays rumors
///
/// # Examples
///
/// ```
/// use rumormill_janitor::JanitorConfig;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.sweep_interval_minutes, 60);
///
/// let config = JanitorConfig::aggressive();
/// assert!(config.days_per_sweep > JanitorConfig::default().days_per_sweep);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JanitorConfig {
    /// Minutes between sweeps
    pub sweep_interval_minutes: u64,

    /// Days of inactivity each sweep accounts for
    pub days_per_sweep: f64,

    /// Report what a sweep would change without saving anything
    pub dry_run: bool,
}

impl Default for JanitorConfig {
    /// Hourly sweeps, one day of decay each
    fn default() -> Self {
        Self {
            sweep_interval_minutes: 60,
            days_per_sweep: 1.0,
            dry_run: false,
        }
    }
}

impl JanitorConfig {
    /// Frequent sweeps that age rumors quickly
    pub fn aggressive() -> Self {
        Self {
            sweep_interval_minutes: 15,
            days_per_sweep: 3.0,
            dry_run: false,
        }
    }

    /// Infrequent sweeps that let rumors linger
    pub fn lenient() -> Self {
        Self {
            sweep_interval_minutes: 240,
            days_per_sweep: 0.5,
            dry_run: false,
        }
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_minutes == 0 {
            return Err("sweep_interval_minutes must be greater than 0".to_string());
        }
        if !self.days_per_sweep.is_finite() || self.days_per_sweep < 0.0 {
            return Err("days_per_sweep must be a non-negative number".to_string());
        }
        Ok(())
    }
}

/// Where the rumor database lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path (":memory:" for a throwaway store)
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "rumormill.db".to_string(),
        }
    }
}

/// Which text generator backs mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Canned responses, no network
    #[default]
    Mock,
    /// Local Ollama server
    Ollama,
}

/// Text generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend to use
    pub provider: LlmProvider,
    /// Ollama base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Attempts per request
    pub max_retries: u32,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Mock,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            max_retries: 3,
            timeout_secs: 30,
            temperature: 0.7,
        }
    }
}

/// Everything the janitor binary needs, one section per component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sweep schedule
    pub janitor: JanitorConfig,
    /// Rumor database
    pub database: DatabaseConfig,
    /// Text generator
    pub llm: LlmConfig,
    /// Rumor service tunables
    pub service: ServiceConfig,
    /// Transformer tunables
    pub transformer: TransformerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JanitorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| JanitorError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, JanitorError> {
        let config: AppConfig = toml::from_str(toml_str)
            .map_err(|e| JanitorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, JanitorError> {
        toml::to_string_pretty(self).map_err(|e| JanitorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), JanitorError> {
        self.janitor
            .validate()
            .map_err(|e| JanitorError::Config(format!("[janitor] {}", e)))?;
        self.service
            .validate()
            .map_err(|e| JanitorError::Config(format!("[service] {}", e)))?;
        self.transformer
            .validate()
            .map_err(|e| JanitorError::Config(format!("[transformer] {}", e)))?;
        if self.database.path.trim().is_empty() {
            return Err(JanitorError::Config("[database] path must not be empty".to_string()));
        }
        if self.llm.max_retries == 0 {
            return Err(JanitorError::Config("[llm] max_retries must be greater than 0".to_string()));
        }
        Ok(())
    }
}
