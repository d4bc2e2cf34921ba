//! Request and response types for the rumor service

use rumormill_domain::{RumorCategory, RumorId, RumorSeverity, VariantId};
use rumormill_transformer::MutationChainAnalysis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default truth value for a new rumor when the caller gives none
pub const DEFAULT_TRUTH_VALUE: f64 = 0.5;

/// Parameters for creating a rumor
///
/// Category and severity names are plain strings so callers can pass through
/// whatever their world uses. Unknown names are coerced to `Other` and
/// `Minor` respectively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRumor {
    /// Entity that starts the rumor
    pub originator_id: String,
    /// The event as it actually happened
    pub content: String,
    /// Category names
    #[serde(default)]
    pub categories: Vec<String>,
    /// Severity name
    #[serde(default)]
    pub severity: Option<String>,
    /// How true the rumor is, in [0, 1]
    #[serde(default)]
    pub truth_value: Option<f64>,
}

impl CreateRumor {
    /// Minimal request: originator and content
    pub fn new(originator_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            originator_id: originator_id.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set category names
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the severity name
    pub fn severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    /// Set the truth value
    pub fn truth_value(mut self, truth_value: f64) -> Self {
        self.truth_value = Some(truth_value);
        self
    }
}

/// How a retelling should be distorted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationContext {
    /// Personality traits of the teller
    #[serde(default)]
    pub traits: Vec<String>,
    /// Distortion in [0, 1]; the service default applies when unset
    #[serde(default)]
    pub distortion_level: Option<f64>,
    /// Optional slant, e.g. "more sinister"
    #[serde(default)]
    pub direction: Option<String>,
    /// Teller's mood, e.g. "angry" or "fearful"
    #[serde(default)]
    pub emotional_state: Option<String>,
    /// Social pressure on the teller in [0, 1]
    #[serde(default)]
    pub social_pressure: Option<f64>,
}

impl MutationContext {
    /// Context with only a distortion level
    pub fn with_distortion(distortion_level: f64) -> Self {
        Self {
            distortion_level: Some(distortion_level),
            ..Self::default()
        }
    }
}

/// One entity telling a rumor to another
#[derive(Debug, Clone, Default)]
pub struct SpreadRequest {
    /// Rumor being passed on
    pub rumor_id: RumorId,
    /// Teller; must already know the rumor
    pub from_entity_id: String,
    /// Listener
    pub to_entity_id: String,
    /// Wording to pass on; defaults to the teller's own
    pub variant_id: Option<VariantId>,
    /// Allow the retelling to mutate
    pub mutate: bool,
    /// Chance of mutation when `mutate` is set; the service default applies when unset
    pub mutation_probability: Option<f64>,
    /// Relationship modifier added to the listener's starting belief
    pub relationship_factor: f64,
    /// Listener's predisposition modifier
    pub receiver_bias: f64,
    /// Distortion settings for a mutated retelling
    pub mutation_context: Option<MutationContext>,
}

impl SpreadRequest {
    /// Faithful retelling with neutral modifiers
    pub fn new(rumor_id: RumorId, from_entity_id: impl Into<String>, to_entity_id: impl Into<String>) -> Self {
        Self {
            rumor_id,
            from_entity_id: from_entity_id.into(),
            to_entity_id: to_entity_id.into(),
            ..Self::default()
        }
    }

    /// Pass on a specific variant
    pub fn variant(mut self, variant_id: VariantId) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    /// Allow mutation at the configured default chance
    pub fn may_mutate(mut self) -> Self {
        self.mutate = true;
        self.mutation_probability = None;
        self
    }

    /// Allow mutation with the given probability
    pub fn mutate(mut self, probability: f64) -> Self {
        self.mutate = true;
        self.mutation_probability = Some(probability);
        self
    }

    /// Set relationship and receiver modifiers
    pub fn modifiers(mut self, relationship_factor: f64, receiver_bias: f64) -> Self {
        self.relationship_factor = relationship_factor;
        self.receiver_bias = receiver_bias;
        self
    }

    /// Set distortion settings for a mutated retelling
    pub fn mutation_context(mut self, context: MutationContext) -> Self {
        self.mutation_context = Some(context);
        self
    }
}

/// Which rumors to summarise for narrative use
#[derive(Debug, Clone)]
pub struct ContextQuery {
    /// Summarise from this entity's point of view; general view when unset
    pub entity_id: Option<String>,
    /// Maximum number of entries
    pub num_rumors: usize,
    /// Minimum believability (the entity's own, or the rumor average)
    pub min_believability: f64,
    /// Only rumors at least this severe
    pub min_severity: Option<RumorSeverity>,
    /// Only rumors with any of these categories
    pub categories: Vec<RumorCategory>,
}

impl Default for ContextQuery {
    fn default() -> Self {
        Self {
            entity_id: None,
            num_rumors: 3,
            min_believability: 0.0,
            min_severity: None,
            categories: Vec::new(),
        }
    }
}

impl ContextQuery {
    /// Entity view
    pub fn for_entity(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            ..Self::default()
        }
    }

    /// General view across all active rumors
    pub fn general() -> Self {
        Self::default()
    }

    /// Limit the number of entries
    pub fn limit(mut self, num_rumors: usize) -> Self {
        self.num_rumors = num_rumors;
        self
    }

    /// Require a minimum believability
    pub fn min_believability(mut self, min_believability: f64) -> Self {
        self.min_believability = min_believability;
        self
    }
}

/// One rumor as summarised for narrative use
#[derive(Debug, Clone, PartialEq)]
pub struct RumorContextEntry {
    /// Rumor summarised
    pub rumor_id: RumorId,
    /// Wording the viewer knows (original content in the general view)
    pub content: String,
    /// The entity's belief, or the rumor average in the general view
    pub believability: f64,
    /// Rumor truth value
    pub truth_value: f64,
    /// Rumor severity
    pub severity: RumorSeverity,
    /// Rumor categories
    pub categories: Vec<RumorCategory>,
    /// Entities that know the rumor
    pub spread_count: usize,
}

/// Outcome of a decay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecaySummary {
    /// Active rumors examined
    pub processed: usize,
    /// Rumors whose believability dropped
    pub decayed: usize,
    /// Rumors newly marked expired
    pub expired: usize,
    /// Rumors that could not be updated
    pub errors: usize,
}

/// A rumor whose original content resembles another's
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarRumor {
    /// Similar rumor
    pub rumor_id: RumorId,
    /// Its original content
    pub content: String,
    /// Similarity score in [0, 1]
    pub similarity: f64,
}

/// How one variant drifted from the original telling
#[derive(Debug, Clone, PartialEq)]
pub struct MutationChainReport {
    /// Rumor the variant belongs to
    pub rumor_id: RumorId,
    /// Variant at the end of the chain
    pub variant_id: VariantId,
    /// Its wording
    pub content: String,
    /// Retellings between the original and this variant
    pub depth: usize,
    /// Strategy kinds recorded along the chain
    pub analysis: MutationChainAnalysis,
    /// Word overlap with the original content, in [0, 1]
    pub similarity_to_original: f64,
}

/// Aggregate figures over every stored rumor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RumorStatistics {
    /// All rumors
    pub total_rumors: usize,
    /// Active rumors
    pub active_rumors: usize,
    /// Expired rumors
    pub expired_rumors: usize,
    /// Variants across all rumors
    pub total_variants: usize,
    /// Spread records across all rumors
    pub total_spread_records: usize,
    /// Rumors per category name
    pub category_distribution: BTreeMap<String, usize>,
    /// Rumors per severity name
    pub severity_distribution: BTreeMap<String, usize>,
    /// Mean truth value
    pub average_truth_value: f64,
    /// Mean of per-rumor average believability
    pub average_believability: f64,
    /// Mean spread count
    pub average_spread: f64,
}
