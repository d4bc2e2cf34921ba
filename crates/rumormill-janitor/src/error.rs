//! Error types for janitor operations

use rumormill_service::ServiceError;
use thiserror::Error;

/// Errors that can occur during janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// The rumor service failed before the sweep could start
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
