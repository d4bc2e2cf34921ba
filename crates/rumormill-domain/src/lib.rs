//! Rumormill Domain Layer
//!
//! This crate contains the rumor model and the pure propagation math. It has
//! no infrastructure dependencies and defines the trait interfaces that the
//! store, generator and service crates build upon.
//!
//! ## Key Concepts
//!
//! - **Rumor**: aggregate root, one piece of spreading information
//! - **Variant**: one wording of a rumor, possibly mutated from a parent
//! - **Spread**: one entity's current knowledge of a rumor and its belief
//! - **Severity**: impact rating driving decay, mutation, reach and conviction
//! - **Decay**: loss of believability over time without reinforcement

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod event;
pub mod ids;
pub mod propagation;
pub mod rumor;
pub mod severity;
pub mod spread;
pub mod traits;
pub mod variant;

// Re-exports for convenience
pub use category::RumorCategory;
pub use event::{RumorEvent, RumorEventKind};
pub use ids::{RumorId, VariantId};
pub use rumor::{Rumor, RumorParts, RumorStatus};
pub use severity::RumorSeverity;
pub use spread::{clamp_unit, Spread};
pub use traits::{EventDispatcher, RumorQuery, RumorStore, TextGenerator};
pub use variant::{preview, Variant};

/// Current time in seconds since the Unix epoch
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Seconds in one day, for converting timestamps to day counts
pub const SECONDS_PER_DAY: u64 = 86_400;
