//! Configuration for the content transformer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the rule-based path rewrites text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationMode {
    /// Word-level exaggeration only
    #[default]
    WordEdit,
    /// Typed strategies chosen from the teller's situation
    Strategies,
}

/// Configuration for the content transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Maximum time for a single generation call (seconds)
    pub generation_timeout_secs: u64,

    /// Distortion below which text is returned untouched
    pub no_op_threshold: f64,

    /// Distortion below which the rule-based fallback changes nothing
    pub fallback_threshold: f64,

    /// Maximum teller traits included in a prompt
    pub max_prompt_traits: usize,

    /// Rewrite rules used when the generator is unavailable; `Strategies`
    /// also steers the generator toward one kind of embellishment
    pub mutation_mode: MutationMode,
}

impl TransformerConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.no_op_threshold) {
            return Err("no_op_threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.fallback_threshold) {
            return Err("fallback_threshold must be between 0.0 and 1.0".to_string());
        }
        if self.max_prompt_traits == 0 {
            return Err("max_prompt_traits must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 30,
            no_op_threshold: 0.05,
            fallback_threshold: 0.1,
            max_prompt_traits: 8,
            mutation_mode: MutationMode::WordEdit,
        }
    }
}

impl TransformerConfig {
    /// Aggressive preset: give up on the generator quickly
    pub fn aggressive() -> Self {
        Self {
            generation_timeout_secs: 5,
            max_prompt_traits: 4,
            ..Self::default()
        }
    }

    /// Lenient preset: wait longer for slow local models
    pub fn lenient() -> Self {
        Self {
            generation_timeout_secs: 120,
            max_prompt_traits: 16,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(TransformerConfig::default().validate().is_ok());
        assert!(TransformerConfig::aggressive().validate().is_ok());
        assert!(TransformerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = TransformerConfig::default();
        config.generation_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = TransformerConfig::default();
        config.no_op_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TransformerConfig::lenient();
        let parsed = TransformerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TransformerConfig::from_toml("generation_timeout_secs = 10").unwrap();
        assert_eq!(config.generation_timeout(), Duration::from_secs(10));
        assert_eq!(config.no_op_threshold, 0.05);
        assert_eq!(config.mutation_mode, MutationMode::WordEdit);
    }

    #[test]
    fn test_mutation_mode_from_toml() {
        let config = TransformerConfig::from_toml("mutation_mode = \"strategies\"").unwrap();
        assert_eq!(config.mutation_mode, MutationMode::Strategies);
        assert!(TransformerConfig::from_toml("mutation_mode = \"telepathy\"").is_err());
    }
}
