//! Spread - one entity's current knowledge of a rumor

use crate::VariantId;

/// Clamp a float into [0, 1], mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// What one entity currently knows about a rumor
///
/// There is at most one record per entity; hearing the rumor again updates
/// the record in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Spread {
    /// The knower
    pub entity_id: String,

    /// Which wording they know
    pub variant_id: VariantId,

    /// Who told them, `None` for the originator
    pub heard_from_entity_id: Option<String>,

    believability: f64,

    /// When they first heard it (seconds since Unix epoch)
    pub heard_at: u64,

    /// When it was last repeated to them
    pub last_reinforced_at: u64,
}

impl Spread {
    /// Create a spread record; believability is clamped to [0, 1]
    pub fn new(
        entity_id: impl Into<String>,
        variant_id: VariantId,
        heard_from_entity_id: Option<String>,
        believability: f64,
        heard_at: u64,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            variant_id,
            heard_from_entity_id,
            believability: clamp_unit(believability),
            heard_at,
            last_reinforced_at: heard_at,
        }
    }

    /// How strongly the entity believes its version, in [0, 1]
    pub fn believability(&self) -> f64 {
        self.believability
    }

    /// Assign believability, clamped to [0, 1]
    pub fn set_believability(&mut self, value: f64) {
        self.believability = clamp_unit(value);
    }
}
