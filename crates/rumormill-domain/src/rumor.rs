//! Rumor module - the aggregate root of the propagation engine

use crate::spread::clamp_unit;
use crate::{current_timestamp, RumorCategory, RumorId, RumorSeverity, Spread, Variant, VariantId};
use std::collections::{BTreeMap, HashMap};

/// Lifecycle flag of a rumor
///
/// Decay never deletes a rumor; once aggregate belief is exhausted the rumor
/// is flagged `Expired` and stays in storage until explicitly deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RumorStatus {
    /// Still circulating
    #[default]
    Active,
    /// Nobody really believes it anymore
    Expired,
}

impl RumorStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RumorStatus::Active => "active",
            RumorStatus::Expired => "expired",
        }
    }

    /// Parse a status name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(RumorStatus::Active),
            "expired" => Some(RumorStatus::Expired),
            _ => None,
        }
    }
}

/// Raw fields of a rumor, used by stores to rehydrate the aggregate
#[derive(Debug, Clone)]
pub struct RumorParts {
    /// Unique identifier
    pub id: RumorId,
    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,
    /// Entity that started the rumor
    pub originator_id: String,
    /// The originator's wording
    pub original_content: String,
    /// Topic tags
    pub categories: Vec<RumorCategory>,
    /// Impact rating
    pub severity: RumorSeverity,
    /// Objective accuracy
    pub truth_value: f64,
    /// Every wording, in creation order
    pub variants: Vec<Variant>,
    /// Current knowledge records
    pub spread: Vec<Spread>,
    /// Lifecycle flag
    pub status: RumorStatus,
    /// Optimistic concurrency token
    pub version: u64,
}

/// A piece of information spreading between entities
///
/// The originator, original wording and creation time never change. The
/// variant list only grows, and spread records are keyed by entity so an
/// entity can hold at most one.
#[derive(Debug, Clone, PartialEq)]
pub struct Rumor {
    id: RumorId,
    created_at: u64,
    originator_id: String,
    original_content: String,
    categories: Vec<RumorCategory>,

    /// Impact rating
    pub severity: RumorSeverity,

    truth_value: f64,
    variants: Vec<Variant>,
    spread: BTreeMap<String, Spread>,

    /// Lifecycle flag
    pub status: RumorStatus,

    /// Optimistic concurrency token, managed by the store
    pub version: u64,
}

impl Rumor {
    /// Start a new rumor
    ///
    /// Creates the originator's variant and a spread record giving the
    /// originator full belief in it.
    ///
    /// # Examples
    ///
    /// ```
    /// use rumormill_domain::{Rumor, RumorCategory, RumorSeverity};
    ///
    /// let rumor = Rumor::new(
    ///     "npc_1",
    ///     "The king is ill",
    ///     vec![RumorCategory::Political],
    ///     RumorSeverity::Major,
    ///     0.8,
    ///     1_700_000_000,
    /// );
    /// assert_eq!(rumor.believability_for_entity("npc_1"), Some(1.0));
    /// assert_eq!(rumor.variants().len(), 1);
    /// ```
    pub fn new(
        originator_id: impl Into<String>,
        content: impl Into<String>,
        categories: Vec<RumorCategory>,
        severity: RumorSeverity,
        truth_value: f64,
        created_at: u64,
    ) -> Self {
        let originator_id = originator_id.into();
        let content = content.into();
        let initial = Variant::original(content.clone(), originator_id.clone(), created_at);
        let origin_spread = Spread::new(originator_id.clone(), initial.id, None, 1.0, created_at);

        let mut spread = BTreeMap::new();
        spread.insert(originator_id.clone(), origin_spread);

        let mut rumor = Self {
            id: RumorId::new(),
            created_at,
            originator_id,
            original_content: content,
            categories: Vec::new(),
            severity,
            truth_value: 0.0,
            variants: vec![initial],
            spread,
            status: RumorStatus::Active,
            version: 0,
        };
        rumor.set_categories(categories);
        rumor.set_truth_value(truth_value);
        rumor
    }

    /// Rebuild a rumor from stored fields
    ///
    /// No invariant checking happens here; call [`Rumor::validate`] when the
    /// source is not trusted. Duplicate spread entries for one entity keep the
    /// last one seen.
    pub fn from_parts(parts: RumorParts) -> Self {
        let spread = parts
            .spread
            .into_iter()
            .map(|s| (s.entity_id.clone(), s))
            .collect();

        let mut rumor = Self {
            id: parts.id,
            created_at: parts.created_at,
            originator_id: parts.originator_id,
            original_content: parts.original_content,
            categories: Vec::new(),
            severity: parts.severity,
            truth_value: 0.0,
            variants: parts.variants,
            spread,
            status: parts.status,
            version: parts.version,
        };
        rumor.set_categories(parts.categories);
        rumor.set_truth_value(parts.truth_value);
        rumor
    }

    /// Unique identifier
    pub fn id(&self) -> RumorId {
        self.id
    }

    /// When the rumor was started (seconds since Unix epoch)
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Entity that started the rumor
    pub fn originator_id(&self) -> &str {
        &self.originator_id
    }

    /// The originator's wording
    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    /// Topic tags, never empty
    pub fn categories(&self) -> &[RumorCategory] {
        &self.categories
    }

    /// Replace the topic tags (duplicates dropped, empty becomes `[Other]`)
    pub fn set_categories(&mut self, categories: Vec<RumorCategory>) {
        let mut out: Vec<RumorCategory> = Vec::with_capacity(categories.len());
        for c in categories {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        if out.is_empty() {
            out.push(RumorCategory::Other);
        }
        self.categories = out;
    }

    /// Whether the rumor carries any of the given tags
    pub fn has_any_category(&self, wanted: &[RumorCategory]) -> bool {
        wanted.iter().any(|c| self.categories.contains(c))
    }

    /// Objective accuracy in [0, 1]
    pub fn truth_value(&self) -> f64 {
        self.truth_value
    }

    /// Assign the truth value, clamped to [0, 1]
    pub fn set_truth_value(&mut self, value: f64) {
        self.truth_value = clamp_unit(value);
    }

    /// All wordings in creation order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Spread records ordered by entity id
    pub fn spread_records(&self) -> impl Iterator<Item = &Spread> {
        self.spread.values()
    }

    /// Number of entities that know the rumor
    pub fn spread_count(&self) -> usize {
        self.spread.len()
    }

    /// True iff the entity has a spread record
    pub fn entity_knows_rumor(&self, entity_id: &str) -> bool {
        self.spread.contains_key(entity_id)
    }

    /// Spread record for an entity
    pub fn spread_for_entity(&self, entity_id: &str) -> Option<&Spread> {
        self.spread.get(entity_id)
    }

    /// Variant the entity currently knows
    pub fn latest_variant_id_for_entity(&self, entity_id: &str) -> Option<VariantId> {
        self.spread.get(entity_id).map(|s| s.variant_id)
    }

    /// Look up a variant by id
    pub fn variant_by_id(&self, variant_id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Wording the entity currently knows
    pub fn current_content_for_entity(&self, entity_id: &str) -> Option<&str> {
        let variant_id = self.latest_variant_id_for_entity(entity_id)?;
        self.variant_by_id(variant_id).map(|v| v.content.as_str())
    }

    /// How strongly the entity believes the rumor
    pub fn believability_for_entity(&self, entity_id: &str) -> Option<f64> {
        self.spread.get(entity_id).map(|s| s.believability())
    }

    /// Variant with the highest summed believability across spread records
    ///
    /// Ties go to the earliest created variant, then to the earliest in the
    /// variant list. Returns `None` when nobody knows the rumor.
    pub fn most_believed_variant(&self) -> Option<&Variant> {
        let mut totals: HashMap<VariantId, f64> = HashMap::new();
        for record in self.spread.values() {
            *totals.entry(record.variant_id).or_insert(0.0) += record.believability();
        }

        let mut best: Option<(&Variant, f64)> = None;
        for variant in &self.variants {
            let Some(&total) = totals.get(&variant.id) else {
                continue;
            };
            best = match best {
                None => Some((variant, total)),
                Some((current, current_total)) => {
                    if total > current_total
                        || (total == current_total && variant.created_at < current.created_at)
                    {
                        Some((variant, total))
                    } else {
                        Some((current, current_total))
                    }
                }
            };
        }
        best.map(|(v, _)| v)
    }

    /// Upsert the entity's record with the current time as `heard_at`
    ///
    /// Returns false, leaving the rumor untouched, if the variant is unknown.
    pub fn set_believability_for_entity(
        &mut self,
        entity_id: &str,
        variant_id: VariantId,
        believability: f64,
    ) -> bool {
        if self.variant_by_id(variant_id).is_none() {
            return false;
        }
        let now = current_timestamp();
        match self.spread.get_mut(entity_id) {
            Some(record) => {
                record.variant_id = variant_id;
                record.set_believability(believability);
                record.heard_at = now;
            }
            None => {
                self.spread.insert(
                    entity_id.to_string(),
                    Spread::new(entity_id, variant_id, None, believability, now),
                );
            }
        }
        true
    }

    /// Upsert the entity's record with explicit source and timestamp
    ///
    /// An existing record is overwritten in place and its reinforcement time
    /// moves to `heard_at`. Returns false if the variant is unknown.
    pub fn update_spread_record(
        &mut self,
        entity_id: &str,
        variant_id: VariantId,
        believability: f64,
        heard_from_entity_id: Option<String>,
        heard_at: u64,
    ) -> bool {
        if self.variant_by_id(variant_id).is_none() {
            return false;
        }
        match self.spread.get_mut(entity_id) {
            Some(record) => {
                record.variant_id = variant_id;
                record.set_believability(believability);
                record.heard_from_entity_id = heard_from_entity_id;
                record.heard_at = heard_at;
                record.last_reinforced_at = heard_at;
            }
            None => {
                self.spread.insert(
                    entity_id.to_string(),
                    Spread::new(entity_id, variant_id, heard_from_entity_id, believability, heard_at),
                );
            }
        }
        true
    }

    /// Add `delta` to an entity's believability, returning the new value
    pub fn adjust_believability(&mut self, entity_id: &str, delta: f64) -> Option<f64> {
        let record = self.spread.get_mut(entity_id)?;
        record.set_believability(record.believability() + delta);
        Some(record.believability())
    }

    /// Lower every spread record by `amount`; true if anything changed
    pub fn reduce_all_believability(&mut self, amount: f64) -> bool {
        let mut changed = false;
        for record in self.spread.values_mut() {
            let before = record.believability();
            record.set_believability(before - amount);
            if record.believability() != before {
                changed = true;
            }
        }
        changed
    }

    /// Append a mutated wording
    ///
    /// The parent must already belong to this rumor, which keeps the variant
    /// graph acyclic. A variant is never older than its parent: `created_at`
    /// is raised to the parent's time if needed. Returns the new variant's id,
    /// or `None` if the parent is unknown.
    pub fn add_variant(
        &mut self,
        content: impl Into<String>,
        entity_id: impl Into<String>,
        parent_variant_id: VariantId,
        mutation_metadata: BTreeMap<String, String>,
        created_at: u64,
    ) -> Option<VariantId> {
        let parent_created_at = self.variant_by_id(parent_variant_id)?.created_at;
        let variant = Variant {
            id: VariantId::new(),
            content: content.into(),
            created_at: created_at.max(parent_created_at),
            parent_variant_id: Some(parent_variant_id),
            entity_id: entity_id.into(),
            mutation_metadata,
        };
        let id = variant.id;
        self.variants.push(variant);
        Some(id)
    }

    /// Number of mutation steps from the original telling
    pub fn variant_depth(&self, variant_id: VariantId) -> Option<usize> {
        let mut current = self.variant_by_id(variant_id)?;
        let mut depth = 0;
        while let Some(parent_id) = current.parent_variant_id {
            current = self.variant_by_id(parent_id)?;
            depth += 1;
            if depth > self.variants.len() {
                return None;
            }
        }
        Some(depth)
    }

    /// The chain of variants from the original telling down to `variant_id`
    ///
    /// Root first. `None` if the variant is unknown or its ancestry is broken.
    pub fn lineage(&self, variant_id: VariantId) -> Option<Vec<&Variant>> {
        let mut chain = vec![self.variant_by_id(variant_id)?];
        while let Some(parent_id) = chain[chain.len() - 1].parent_variant_id {
            if chain.len() > self.variants.len() {
                return None;
            }
            chain.push(self.variant_by_id(parent_id)?);
        }
        chain.reverse();
        Some(chain)
    }

    /// Sum of believability across every spread record
    pub fn total_believability(&self) -> f64 {
        self.spread.values().map(|s| s.believability()).sum()
    }

    /// Mean believability across spread records (0 when nobody knows it)
    pub fn average_believability(&self) -> f64 {
        if self.spread.is_empty() {
            return 0.0;
        }
        self.total_believability() / self.spread.len() as f64
    }

    /// Whether decay has exhausted this rumor
    pub fn is_expired(&self) -> bool {
        self.status == RumorStatus::Expired
    }

    /// Flag the rumor as expired
    pub fn mark_expired(&mut self) {
        self.status = RumorStatus::Expired;
    }

    /// Put an expired rumor back into circulation
    pub fn reactivate(&mut self) {
        self.status = RumorStatus::Active;
    }

    /// Check the aggregate invariants
    ///
    /// - at least one variant, the first being an original telling
    /// - every parent reference points at an earlier variant
    /// - every spread record references an existing variant
    /// - the originator has a spread record
    pub fn validate(&self) -> Result<(), String> {
        let Some(first) = self.variants.first() else {
            return Err(format!("Rumor {} has no variants", self.id));
        };
        if !first.is_original() {
            return Err(format!("Rumor {} first variant has a parent", self.id));
        }

        for (idx, variant) in self.variants.iter().enumerate() {
            if let Some(parent_id) = variant.parent_variant_id {
                let parent_ok = self.variants[..idx].iter().any(|v| v.id == parent_id);
                if !parent_ok {
                    return Err(format!(
                        "Variant {} references missing or later parent {}",
                        variant.id, parent_id
                    ));
                }
            }
        }

        for record in self.spread.values() {
            if self.variant_by_id(record.variant_id).is_none() {
                return Err(format!(
                    "Spread record for {} references missing variant {}",
                    record.entity_id, record.variant_id
                ));
            }
        }

        if !self.entity_knows_rumor(&self.originator_id) {
            return Err(format!("Originator {} has no spread record", self.originator_id));
        }

        Ok(())
    }
}
