//! Ollama Generator Implementation
//!
//! Integration with Ollama's local LLM API for retelling rumors.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama generate endpoint
//! - Configurable endpoint, model, temperature and request timeout
//! - Retry logic with exponential backoff
//!
//! # Examples
//!
//! ```no_run
//! use rumormill_llm::OllamaGenerator;
//!
//! let generator = OllamaGenerator::new("http://localhost:11434", "llama3");
//! // `generate_async` inside async code, or the blocking `TextGenerator`
//! // impl from a blocking thread.
//! ```

use crate::LlmError;
use rumormill_domain::TextGenerator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for a single HTTP request
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default sampling temperature; retellings benefit from some creativity
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Ollama API generator for local inference
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_retries: DEFAULT_MAX_RETRIES,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Create a generator against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model name used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text using the Ollama API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Response format is invalid
    pub async fn generate_async(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<OllamaGenerateResponse>()
                            .await
                            .map(|r| r.response)
                            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)));
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    }
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    last_error = Some(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tracing::debug!(attempt = attempts, ?delay, "Retrying Ollama request");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

impl TextGenerator for OllamaGenerator {
    type Error = LlmError;

    /// Blocking wrapper around [`OllamaGenerator::generate_async`]
    ///
    /// Reuses the surrounding tokio runtime when called from a blocking
    /// thread (`spawn_blocking`); otherwise spins up a current-thread runtime.
    /// Must not be called directly from an async task.
    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.generate_async(prompt)),
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| LlmError::Runtime(e.to_string()))?;
                runtime.block_on(self.generate_async(prompt))
            }
        }
    }
}
