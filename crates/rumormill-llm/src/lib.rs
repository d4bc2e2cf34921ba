//! Rumormill Text Generation Layer
//!
//! Implementations of the `TextGenerator` trait from `rumormill-domain`.
//!
//! # Generators
//!
//! - `MockGenerator`: Deterministic double for tests and offline runs
//! - `OllamaGenerator`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use rumormill_llm::MockGenerator;
//! use rumormill_domain::TextGenerator;
//!
//! let generator = MockGenerator::new("The queen is ill");
//! let result = generator.generate("retell this").unwrap();
//! assert_eq!(result, "The queen is ill");
//! ```

#![warn(missing_docs)]

pub mod ollama;

use rumormill_domain::TextGenerator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaGenerator;

/// Errors that can occur during text generation
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Unusable response from the backend
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// No async runtime could be used for a blocking call
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

const ERROR_SENTINEL: &str = "ERROR";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock generator for deterministic testing
///
/// Returns pre-configured responses without any network calls. Responses can
/// be keyed by exact prompt or by a fragment the prompt contains; exact
/// matches win.
///
/// # Examples
///
/// ```
/// use rumormill_llm::MockGenerator;
/// use rumormill_domain::TextGenerator;
///
/// let mut generator = MockGenerator::default();
/// generator.add_response("exact prompt", "exact answer");
/// generator.add_response_containing("Distortion level: extreme", "The king is dead!");
///
/// assert_eq!(generator.generate("exact prompt").unwrap(), "exact answer");
/// assert_eq!(
///     generator.generate("...\nDistortion level: extreme\n...").unwrap(),
///     "The king is dead!"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MockGenerator {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    fragments: Arc<Mutex<Vec<(String, String)>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
    fail_all: bool,
}

impl MockGenerator {
    /// Create a generator with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            fragments: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
            fail_all: false,
        }
    }

    /// Create a generator that fails on every prompt
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Sleep before answering, to exercise caller timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a response for an exact prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), response.into());
    }

    /// Add a response for any prompt containing `fragment`
    ///
    /// Fragments are checked in insertion order.
    pub fn add_response_containing(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        lock(&self.fragments).push((fragment.into(), response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), ERROR_SENTINEL.to_string());
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    fn lookup(&self, prompt: &str) -> String {
        if let Some(response) = lock(&self.responses).get(prompt) {
            return response.clone();
        }
        lock(&self.fragments)
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl TextGenerator for MockGenerator {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *lock(&self.call_count) += 1;

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.fail_all {
            return Err(LlmError::Communication("Mock generator offline".to_string()));
        }

        let response = self.lookup(prompt);
        if response == ERROR_SENTINEL {
            return Err(LlmError::Other("Mock error".to_string()));
        }
        Ok(response)
    }
}
