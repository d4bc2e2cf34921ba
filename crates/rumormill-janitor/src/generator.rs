//! Text generator selected by configuration

use crate::config::{LlmConfig, LlmProvider};
use rumormill_domain::TextGenerator;
use rumormill_llm::{LlmError, MockGenerator, OllamaGenerator};
use std::time::Duration;

/// Either backend behind one concrete type
#[derive(Debug, Clone)]
pub enum ConfiguredGenerator {
    /// Local Ollama server
    Ollama(OllamaGenerator),
    /// Canned responses
    Mock(MockGenerator),
}

impl ConfiguredGenerator {
    /// Build the generator the `[llm]` section asks for
    pub fn from_config(config: &LlmConfig) -> Self {
        match config.provider {
            LlmProvider::Ollama => ConfiguredGenerator::Ollama(
                OllamaGenerator::new(config.endpoint.clone(), config.model.clone())
                    .with_max_retries(config.max_retries)
                    .with_timeout(Duration::from_secs(config.timeout_secs))
                    .with_temperature(config.temperature),
            ),
            LlmProvider::Mock => ConfiguredGenerator::Mock(MockGenerator::default()),
        }
    }

    /// Backend name for logging
    pub fn provider_name(&self) -> &'static str {
        match self {
            ConfiguredGenerator::Ollama(_) => "ollama",
            ConfiguredGenerator::Mock(_) => "mock",
        }
    }
}

impl TextGenerator for ConfiguredGenerator {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match self {
            ConfiguredGenerator::Ollama(generator) => generator.generate(prompt),
            ConfiguredGenerator::Mock(generator) => generator.generate(prompt),
        }
    }
}
