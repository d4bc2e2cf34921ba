//! Domain events emitted by the rumor service

use crate::RumorId;
use std::collections::BTreeMap;

/// What happened to a rumor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RumorEventKind {
    /// A rumor was started
    Created,
    /// An entity heard the rumor for the first time
    Spread,
    /// An entity heard the rumor again
    Reinforced,
    /// A new variant was produced
    Mutated,
    /// The rumor was removed
    Deleted,
}

impl RumorEventKind {
    /// Get the event kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RumorEventKind::Created => "rumor.created",
            RumorEventKind::Spread => "rumor.spread",
            RumorEventKind::Reinforced => "rumor.reinforced",
            RumorEventKind::Mutated => "rumor.mutated",
            RumorEventKind::Deleted => "rumor.deleted",
        }
    }
}

impl std::fmt::Display for RumorEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single domain event
#[derive(Debug, Clone, PartialEq)]
pub struct RumorEvent {
    /// Kind of occurrence
    pub kind: RumorEventKind,
    /// Rumor concerned
    pub rumor_id: RumorId,
    /// Entity that triggered the event, if any
    pub entity_id: Option<String>,
    /// When it happened (seconds since Unix epoch)
    pub timestamp: u64,
    /// Kind-specific payload
    pub data: BTreeMap<String, String>,
}

impl RumorEvent {
    /// Create an event with an empty payload
    pub fn new(kind: RumorEventKind, rumor_id: RumorId, entity_id: Option<String>, timestamp: u64) -> Self {
        Self {
            kind,
            rumor_id,
            entity_id,
            timestamp,
            data: BTreeMap::new(),
        }
    }

    /// Add a payload entry
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }
}
