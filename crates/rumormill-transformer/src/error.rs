//! Error types for the content transformer

use thiserror::Error;

/// Errors raised while talking to the text generator
///
/// None of these escape `ContentTransformer::transform`; they decide when the
/// rule-based fallback takes over.
#[derive(Error, Debug)]
pub enum TransformerError {
    /// Generator returned an error or its task failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generator did not answer in time
    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Nothing usable was left after cleaning the response
    #[error("Empty response from generator")]
    EmptyResponse,

    /// Truthfulness answer contained no usable score
    #[error("Invalid score: {0}")]
    InvalidScore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
