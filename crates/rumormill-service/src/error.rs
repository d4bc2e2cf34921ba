//! Error types for the rumor service

use rumormill_domain::RumorId;
use thiserror::Error;

/// Errors surfaced by the rumor service
///
/// Routine absence (unknown rumor, entity or variant) is not an error; the
/// service answers with `false`, `None` or an empty list instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Rumor store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Caller passed an argument that can never be valid
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Concurrent writers kept winning the race for this rumor
    #[error("Gave up saving rumor {rumor_id} after {attempts} conflicting attempts")]
    Conflict {
        /// Rumor being updated
        rumor_id: RumorId,
        /// Attempts made
        attempts: u32,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
