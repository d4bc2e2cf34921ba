//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the rumor model and the
//! infrastructure around it. Implementations live in other crates.

use crate::{Rumor, RumorCategory, RumorEvent, RumorId, RumorSeverity};

/// Trait for persisting rumor aggregates
///
/// Implemented by the infrastructure layer (rumormill-store). A rumor is
/// always saved whole; implementations must not persist half of an update.
pub trait RumorStore {
    /// Error type for store operations
    type Error;

    /// Insert or update a rumor
    ///
    /// Implementations using optimistic versioning reject stale writes and
    /// bump `rumor.version` on success.
    fn save_rumor(&mut self, rumor: &mut Rumor) -> Result<(), Self::Error>;

    /// Get a rumor by ID
    fn get_rumor(&self, id: RumorId) -> Result<Option<Rumor>, Self::Error>;

    /// Every stored rumor, oldest first
    ///
    /// Bulk listings may skip rows that cannot be decoded; use
    /// [`RumorStore::get_rumor_ids`] with [`RumorStore::get_rumor`] to see
    /// such failures one rumor at a time.
    fn get_all_rumors(&self) -> Result<Vec<Rumor>, Self::Error>;

    /// Ids of every stored rumor, in the same order as `get_all_rumors`
    fn get_rumor_ids(&self) -> Result<Vec<RumorId>, Self::Error>;

    /// Rumors the entity has a spread record for
    fn get_rumors_by_entity(&self, entity_id: &str) -> Result<Vec<Rumor>, Self::Error>;

    /// Rumors matching all given criteria
    fn get_rumors_by_filters(&self, query: &RumorQuery) -> Result<Vec<Rumor>, Self::Error>;

    /// Remove a rumor, returning whether it existed
    fn delete_rumor(&mut self, id: RumorId) -> Result<bool, Self::Error>;

    /// Whether `error` reports a lost optimistic-versioning race
    ///
    /// Callers reload and retry on conflicts. Stores without versioning never
    /// produce one.
    fn is_conflict(_error: &Self::Error) -> bool {
        false
    }
}

/// Query criteria for retrieving rumors
#[derive(Debug, Clone, Default)]
pub struct RumorQuery {
    /// Match rumors carrying any of these categories
    pub categories: Vec<RumorCategory>,

    /// Filter by minimum severity
    pub min_severity: Option<RumorSeverity>,

    /// Only rumors this entity knows
    pub entity_id: Option<String>,

    /// Minimum belief of `entity_id` (ignored without an entity)
    pub min_believability: Option<f64>,

    /// Case-insensitive substring of the original content
    pub text: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl RumorQuery {
    /// Whether a rumor satisfies every criterion except `limit`
    pub fn matches(&self, rumor: &Rumor) -> bool {
        if !self.categories.is_empty() && !rumor.has_any_category(&self.categories) {
            return false;
        }
        if let Some(min) = self.min_severity {
            if rumor.severity < min {
                return false;
            }
        }
        if let Some(entity) = &self.entity_id {
            match rumor.believability_for_entity(entity) {
                None => return false,
                Some(b) => {
                    if let Some(min) = self.min_believability {
                        if b < min {
                            return false;
                        }
                    }
                }
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !rumor.original_content().to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Trait for text generation
///
/// Implemented by the infrastructure layer (rumormill-llm). Callers treat
/// every failure the same way, so implementations only need to report that
/// generation did not succeed.
pub trait TextGenerator {
    /// Error type for generation
    type Error;

    /// Generate a completion for the prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Trait for publishing domain events
///
/// Delivery is best-effort; implementations must not block indefinitely.
pub trait EventDispatcher {
    /// Error type for publishing
    type Error;

    /// Publish one event
    fn publish(&self, event: &RumorEvent) -> Result<(), Self::Error>;
}
