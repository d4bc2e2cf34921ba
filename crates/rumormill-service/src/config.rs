//! Configuration for the rumor service

use serde::{Deserialize, Serialize};

/// Tunables for spreading, reinforcement and decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Believability a listener starts from before truth and relationship
    pub base_believability: f64,

    /// Weight of the rumor's truth value in a listener's starting belief
    pub truth_weight: f64,

    /// Flat belief added when a listener hears the rumor again
    pub reinforcement_bonus: f64,

    /// Share of the teller's computed believability added on reinforcement
    pub reinforcement_source_weight: f64,

    /// Chance of mutation when a spread asks for it without a probability
    pub default_mutation_probability: f64,

    /// Scale the default chance by severity and how widely the rumor has
    /// spread, instead of using it as is
    pub severity_scaled_mutation: bool,

    /// Distortion used when a mutation request does not set one
    pub default_distortion: f64,

    /// Base believability lost per log-day of inactivity
    pub base_decay: f64,

    /// Average believability at or below which a rumor expires
    pub expiry_threshold: f64,

    /// Attempts at a read-modify-write before reporting a conflict
    pub max_save_retries: u32,

    /// Characters of content included in event previews
    pub preview_chars: usize,

    /// Ask the text generator to score mutated variants instead of the heuristic
    pub ai_truth_evaluation: bool,
}

impl ServiceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let unit_fields = [
            ("base_believability", self.base_believability),
            ("truth_weight", self.truth_weight),
            ("reinforcement_bonus", self.reinforcement_bonus),
            ("reinforcement_source_weight", self.reinforcement_source_weight),
            ("default_mutation_probability", self.default_mutation_probability),
            ("default_distortion", self.default_distortion),
            ("base_decay", self.base_decay),
            ("expiry_threshold", self.expiry_threshold),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.max_save_retries == 0 {
            return Err("max_save_retries must be greater than 0".to_string());
        }
        if self.preview_chars == 0 {
            return Err("preview_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_believability: 0.3,
            truth_weight: 0.4,
            reinforcement_bonus: 0.2,
            reinforcement_source_weight: 0.1,
            default_mutation_probability: 0.2,
            severity_scaled_mutation: false,
            default_distortion: 0.5,
            base_decay: rumormill_domain::propagation::DEFAULT_BASE_DECAY,
            expiry_threshold: 0.1,
            max_save_retries: 3,
            preview_chars: 50,
            ai_truth_evaluation: false,
        }
    }
}

impl ServiceConfig {
    /// Volatile world: rumors mutate and fade quickly
    pub fn volatile() -> Self {
        Self {
            default_mutation_probability: 0.4,
            default_distortion: 0.7,
            base_decay: 0.1,
            expiry_threshold: 0.15,
            ..Self::default()
        }
    }

    /// Stable world: rumors are retold faithfully and linger
    pub fn stable() -> Self {
        Self {
            default_mutation_probability: 0.1,
            default_distortion: 0.3,
            base_decay: 0.02,
            expiry_threshold: 0.05,
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
