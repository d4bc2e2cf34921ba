//! Rumor service orchestration

use crate::config::ServiceConfig;
use crate::context::render_rumor_context;
use crate::error::ServiceError;
use crate::types::{
    ContextQuery, CreateRumor, DecaySummary, MutationChainReport, MutationContext, RumorContextEntry,
    RumorStatistics, SimilarRumor, SpreadRequest, DEFAULT_TRUTH_VALUE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rumormill_domain::propagation::{
    believability_threshold, decay, mutation_probability, spread_radius, DEFAULT_SATURATION,
};
use rumormill_domain::{
    clamp_unit, current_timestamp, preview, EventDispatcher, Rumor, RumorCategory, RumorEvent,
    RumorEventKind, RumorId, RumorQuery, RumorSeverity, RumorStore, TextGenerator, Variant, VariantId,
    SECONDS_PER_DAY,
};
use rumormill_transformer::{
    analyze_mutation_chain, content_similarity, ContentTransformer, MutationKind, TransformRequest,
};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Variant metadata listing the strategy kinds behind a retelling
const MUTATION_TYPES_KEY: &str = "mutation_types";

fn store_error<E: Display>(e: E) -> ServiceError {
    ServiceError::Store(e.to_string())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// A retelling computed before the read-modify-write loop
struct PendingVariant {
    content: String,
    metadata: BTreeMap<String, String>,
    distortion: f64,
}

/// What a spread changed, reported back out of the retry loop
struct SpreadApplied {
    kind: RumorEventKind,
    believability: f64,
    variant_id: VariantId,
    reactivated: bool,
}

/// Orchestrates rumor creation, spreading, mutation and decay
///
/// The store sits behind a `std::sync::Mutex` that is only held for
/// synchronous load/modify/save sections, never across an `.await`. Writes
/// use the store's optimistic versioning: a lost race reloads the rumor and
/// reapplies the change, up to `max_save_retries` attempts.
pub struct RumorService<S, G, D>
where
    S: RumorStore,
    G: TextGenerator,
    D: EventDispatcher,
{
    store: Arc<Mutex<S>>,
    transformer: ContentTransformer<G>,
    dispatcher: D,
    config: ServiceConfig,
    rng: Mutex<StdRng>,
}

impl<S, G, D> RumorService<S, G, D>
where
    S: RumorStore,
    S::Error: Display,
    G: TextGenerator + Send + Sync + 'static,
    G::Error: Display,
    D: EventDispatcher,
    D::Error: Display,
{
    /// Create a service owning `store`
    pub fn new(
        store: S,
        transformer: ContentTransformer<G>,
        dispatcher: D,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        Self::with_shared_store(Arc::new(Mutex::new(store)), transformer, dispatcher, config)
    }

    /// Create a service over a store shared with other components
    pub fn with_shared_store(
        store: Arc<Mutex<S>>,
        transformer: ContentTransformer<G>,
        dispatcher: D,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        config.validate().map_err(ServiceError::Config)?;
        Ok(Self {
            store,
            transformer,
            dispatcher,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// Seed the mutation draw for reproducible runs
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Current configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, S>, ServiceError> {
        self.store
            .lock()
            .map_err(|e| ServiceError::Store(format!("Store lock poisoned: {}", e)))
    }

    fn load(&self, rumor_id: RumorId) -> Result<Option<Rumor>, ServiceError> {
        let store = self.lock_store()?;
        store.get_rumor(rumor_id).map_err(store_error)
    }

    fn load_all(&self) -> Result<Vec<Rumor>, ServiceError> {
        let store = self.lock_store()?;
        store.get_all_rumors().map_err(store_error)
    }

    /// Load, change and save one rumor, retrying lost version races
    ///
    /// `apply` returning `None` abandons the change without saving. Returns
    /// `Ok(None)` when the rumor does not exist or `apply` declined.
    fn modify_rumor<T>(
        &self,
        rumor_id: RumorId,
        mut apply: impl FnMut(&mut Rumor) -> Option<T>,
    ) -> Result<Option<(T, Rumor)>, ServiceError> {
        let attempts = self.config.max_save_retries.max(1);
        for attempt in 1..=attempts {
            let mut store = self.lock_store()?;
            let Some(mut rumor) = store.get_rumor(rumor_id).map_err(store_error)? else {
                return Ok(None);
            };
            let Some(outcome) = apply(&mut rumor) else {
                return Ok(None);
            };
            match store.save_rumor(&mut rumor) {
                Ok(()) => return Ok(Some((outcome, rumor))),
                Err(e) if S::is_conflict(&e) => {
                    warn!(
                        "Version conflict saving rumor {} (attempt {}/{}): {}",
                        rumor_id, attempt, attempts, e
                    );
                }
                Err(e) => return Err(store_error(e)),
            }
        }
        Err(ServiceError::Conflict { rumor_id, attempts })
    }

    fn publish(&self, event: RumorEvent) {
        if let Err(e) = self.dispatcher.publish(&event) {
            error!("Failed to publish {} for rumor {}: {}", event.kind, event.rumor_id, e);
        }
    }

    /// Start a new rumor
    ///
    /// The originator knows it with full belief. Unknown category and
    /// severity names are coerced to `Other` and `Minor`.
    pub async fn create_rumor(&self, request: CreateRumor) -> Result<RumorId, ServiceError> {
        if request.originator_id.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("originator_id must not be empty".to_string()));
        }
        if request.content.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("content must not be empty".to_string()));
        }

        let categories: Vec<RumorCategory> = request.categories.iter().map(|raw| parse_category(raw)).collect();
        let severity = request
            .severity
            .as_deref()
            .map(parse_severity)
            .unwrap_or_default();
        let truth_value = request.truth_value.unwrap_or(DEFAULT_TRUTH_VALUE);

        let mut rumor = Rumor::new(
            request.originator_id.clone(),
            request.content,
            categories,
            severity,
            truth_value,
            current_timestamp(),
        );
        {
            let mut store = self.lock_store()?;
            store.save_rumor(&mut rumor).map_err(store_error)?;
        }
        info!("Created rumor {} from {}", rumor.id(), rumor.originator_id());

        let category_names: Vec<&str> = rumor.categories().iter().map(|c| c.as_str()).collect();
        self.publish(
            RumorEvent::new(
                RumorEventKind::Created,
                rumor.id(),
                Some(rumor.originator_id().to_string()),
                rumor.created_at(),
            )
            .with("content_preview", preview(rumor.original_content(), self.config.preview_chars))
            .with("severity", rumor.severity)
            .with("categories", category_names.join(","))
            .with("truth_value", format!("{:.2}", rumor.truth_value())),
        );
        Ok(rumor.id())
    }

    /// Get a rumor by id
    pub async fn get_rumor(&self, rumor_id: RumorId) -> Result<Option<Rumor>, ServiceError> {
        self.load(rumor_id)
    }

    /// Delete a rumor, returning whether it existed
    pub async fn delete_rumor(&self, rumor_id: RumorId) -> Result<bool, ServiceError> {
        let removed = {
            let mut store = self.lock_store()?;
            store.delete_rumor(rumor_id).map_err(store_error)?
        };
        if removed {
            info!("Deleted rumor {}", rumor_id);
            self.publish(RumorEvent::new(RumorEventKind::Deleted, rumor_id, None, current_timestamp()));
        } else {
            debug!("Delete of unknown rumor {}", rumor_id);
        }
        Ok(removed)
    }

    /// Whether this retelling should mutate
    fn should_mutate(&self, request: &SpreadRequest, rumor: &Rumor) -> bool {
        if !request.mutate {
            return false;
        }
        let probability = effective_mutation_probability(
            &self.config,
            request.mutation_probability,
            rumor.severity,
            rumor.spread_count(),
        );
        if probability >= 1.0 {
            return true;
        }
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        let draw: f64 = self.rng.lock().unwrap_or_else(PoisonError::into_inner).random();
        draw < probability
    }

    /// Retell `source` through the transformer and describe the result
    async fn retell(
        &self,
        rumor: &Rumor,
        source: &Variant,
        teller: &str,
        context: &MutationContext,
    ) -> PendingVariant {
        let distortion = clamp_unit(context.distortion_level.unwrap_or(self.config.default_distortion));
        let days_since_original =
            current_timestamp().saturating_sub(rumor.created_at()) as f64 / SECONDS_PER_DAY as f64;
        let request = TransformRequest {
            original_event: rumor.original_content().to_string(),
            current_text: source.content.clone(),
            traits: context.traits.clone(),
            distortion_level: distortion,
            direction: context.direction.clone(),
            emotional_state: context.emotional_state.clone(),
            social_pressure: context.social_pressure,
            days_since_original,
            chain_depth: rumor.variant_depth(source.id).unwrap_or(0),
        };
        let outcome = self.transformer.transform_detailed(&request).await;

        let estimated_truth = if self.config.ai_truth_evaluation {
            self.transformer
                .evaluate_truthfulness(rumor.original_content(), &outcome.text, rumor.truth_value())
                .await
        } else {
            self.transformer
                .calculate_truth_value(rumor.original_content(), &outcome.text, rumor.truth_value())
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("distortion_level".to_string(), format!("{:.2}", distortion));
        metadata.insert("teller".to_string(), teller.to_string());
        metadata.insert("estimated_truth".to_string(), format!("{:.3}", estimated_truth));
        metadata.insert("source".to_string(), outcome.source.as_str().to_string());
        if !context.traits.is_empty() {
            metadata.insert("traits".to_string(), context.traits.join(", "));
        }
        if let Some(direction) = &context.direction {
            metadata.insert("direction".to_string(), direction.clone());
        }
        if !outcome.mutations.is_empty() {
            let kinds: Vec<&str> = outcome.mutations.iter().map(MutationKind::as_str).collect();
            metadata.insert(MUTATION_TYPES_KEY.to_string(), kinds.join(","));
        }

        PendingVariant {
            content: outcome.text,
            metadata,
            distortion,
        }
    }

    /// One entity tells a rumor to another
    ///
    /// Returns `Ok(false)` when the rumor is unknown, the teller does not
    /// know it, or the variant cannot be resolved. A listener who already
    /// knows the rumor is reinforced instead of getting a second record.
    pub async fn spread_rumor(&self, request: SpreadRequest) -> Result<bool, ServiceError> {
        let from = request.from_entity_id.as_str();
        let to = request.to_entity_id.as_str();
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("entity ids must not be empty".to_string()));
        }
        if from == to {
            warn!("Entity {} cannot spread rumor {} to itself", from, request.rumor_id);
            return Ok(false);
        }

        let Some(rumor) = self.load(request.rumor_id)? else {
            warn!("Cannot spread unknown rumor {}", request.rumor_id);
            return Ok(false);
        };
        if !rumor.entity_knows_rumor(from) {
            warn!("Entity {} does not know rumor {}", from, request.rumor_id);
            return Ok(false);
        }
        let Some(source_id) = request
            .variant_id
            .or_else(|| rumor.latest_variant_id_for_entity(from))
        else {
            warn!("No variant to spread for rumor {}", request.rumor_id);
            return Ok(false);
        };
        let Some(source) = rumor.variant_by_id(source_id) else {
            warn!("Variant {} not found in rumor {}", source_id, request.rumor_id);
            return Ok(false);
        };

        let mutation = if self.should_mutate(&request, &rumor) {
            let context = request.mutation_context.clone().unwrap_or_default();
            let pending = self.retell(&rumor, source, from, &context).await;
            if pending.content == source.content {
                debug!("Retelling of rumor {} came back unchanged", request.rumor_id);
                None
            } else {
                Some(pending)
            }
        } else {
            None
        };

        let config = &self.config;
        let modifiers = finite_or_zero(request.relationship_factor) + finite_or_zero(request.receiver_bias);
        let now = current_timestamp();

        let applied = self.modify_rumor(request.rumor_id, |rumor| {
            if !rumor.entity_knows_rumor(from) {
                return None;
            }
            let variant_id = match &mutation {
                Some(pending) => {
                    rumor.add_variant(pending.content.clone(), to, source_id, pending.metadata.clone(), now)?
                }
                None => rumor.variant_by_id(source_id).map(|v| v.id)?,
            };

            let base = clamp_unit(config.base_believability + config.truth_weight * rumor.truth_value() + modifiers);
            let (kind, believability) = match rumor.believability_for_entity(to) {
                Some(old) => (
                    RumorEventKind::Reinforced,
                    clamp_unit(old + config.reinforcement_bonus + config.reinforcement_source_weight * base),
                ),
                None => (RumorEventKind::Spread, base),
            };
            rumor.update_spread_record(to, variant_id, believability, Some(from.to_string()), now);

            let reactivated = rumor.is_expired();
            if reactivated {
                rumor.reactivate();
            }
            Some(SpreadApplied {
                kind,
                believability,
                variant_id,
                reactivated,
            })
        })?;

        let Some((applied, rumor)) = applied else {
            warn!("Rumor {} disappeared before the spread could be saved", request.rumor_id);
            return Ok(false);
        };

        debug!(
            "{} {} -> {} for rumor {} (believability {:.3})",
            applied.kind, from, to, rumor.id(), applied.believability
        );
        if applied.reactivated {
            info!("Rumor {} reactivated by spread", rumor.id());
        }

        if let Some(pending) = &mutation {
            self.publish(
                RumorEvent::new(RumorEventKind::Mutated, rumor.id(), Some(to.to_string()), now)
                    .with("variant_id", applied.variant_id)
                    .with("parent_variant_id", source_id)
                    .with("teller", from)
                    .with("distortion_level", format!("{:.2}", pending.distortion))
                    .with("content_preview", preview(&pending.content, config.preview_chars)),
            );
        }
        self.publish(
            RumorEvent::new(applied.kind, rumor.id(), Some(to.to_string()), now)
                .with("from_entity_id", from)
                .with("variant_id", applied.variant_id)
                .with("believability", format!("{:.3}", applied.believability)),
        );
        Ok(true)
    }

    /// Create a new variant derived from `parent_variant_id`
    ///
    /// Returns `Ok(None)` when the rumor or parent variant does not exist.
    pub async fn mutate_rumor(
        &self,
        rumor_id: RumorId,
        entity_id: &str,
        parent_variant_id: VariantId,
        context: Option<MutationContext>,
    ) -> Result<Option<Variant>, ServiceError> {
        if entity_id.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("entity_id must not be empty".to_string()));
        }
        let Some(rumor) = self.load(rumor_id)? else {
            warn!("Cannot mutate unknown rumor {}", rumor_id);
            return Ok(None);
        };
        let Some(parent) = rumor.variant_by_id(parent_variant_id) else {
            warn!("Parent variant {} not found in rumor {}", parent_variant_id, rumor_id);
            return Ok(None);
        };

        let context = context.unwrap_or_default();
        let pending = self.retell(&rumor, parent, entity_id, &context).await;
        let now = current_timestamp();

        let applied = self.modify_rumor(rumor_id, |rumor| {
            rumor.add_variant(
                pending.content.clone(),
                entity_id,
                parent_variant_id,
                pending.metadata.clone(),
                now,
            )
        })?;
        let Some((variant_id, rumor)) = applied else {
            return Ok(None);
        };
        let variant = rumor.variant_by_id(variant_id).cloned();

        if let Some(variant) = &variant {
            debug!("Mutated rumor {} into variant {}", rumor_id, variant.id);
            self.publish(
                RumorEvent::new(RumorEventKind::Mutated, rumor_id, Some(entity_id.to_string()), now)
                    .with("variant_id", variant.id)
                    .with("parent_variant_id", parent_variant_id)
                    .with("distortion_level", format!("{:.2}", pending.distortion))
                    .with("content_preview", variant.preview(self.config.preview_chars)),
            );
        }
        Ok(variant)
    }

    /// Apply one decay step to a rumor; reports (decayed, expired)
    fn decay_step(&self, rumor: &mut Rumor, days_since_active: f64) -> Option<(bool, bool)> {
        if rumor.is_expired() {
            return None;
        }
        let amount = decay(days_since_active, rumor.severity, self.config.base_decay);
        let decayed = rumor.reduce_all_believability(amount);
        let expired = rumor.average_believability() <= self.config.expiry_threshold;
        if expired {
            rumor.mark_expired();
        }
        (decayed || expired).then_some((decayed, expired))
    }

    /// Decay every active rumor by `days_since_active` days of inactivity
    ///
    /// Rumors whose average believability falls to the expiry threshold are
    /// marked expired. Each rumor is loaded and saved on its own: one that
    /// cannot be read or updated is logged and counted in `errors`, and the
    /// pass carries on with the rest.
    pub async fn decay_all_rumors(&self, days_since_active: f64) -> Result<DecaySummary, ServiceError> {
        let rumor_ids = {
            let store = self.lock_store()?;
            store.get_rumor_ids().map_err(store_error)?
        };
        let mut summary = DecaySummary::default();

        for rumor_id in rumor_ids {
            let mut active = false;
            let result = self.modify_rumor(rumor_id, |r| {
                active = !r.is_expired();
                self.decay_step(r, days_since_active)
            });
            match result {
                Ok(Some(((decayed, expired), _))) => {
                    summary.processed += 1;
                    if decayed {
                        summary.decayed += 1;
                    }
                    if expired {
                        summary.expired += 1;
                        info!("Rumor {} expired", rumor_id);
                    }
                }
                Ok(None) => {
                    if active {
                        summary.processed += 1;
                    }
                }
                Err(e) => {
                    error!("Failed to decay rumor {}: {}", rumor_id, e);
                    if active {
                        summary.processed += 1;
                    }
                    summary.errors += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            decayed = summary.decayed,
            expired = summary.expired,
            errors = summary.errors,
            "Decay pass complete"
        );
        Ok(summary)
    }

    /// Report what [`Self::decay_all_rumors`] would do without saving
    pub async fn preview_decay(&self, days_since_active: f64) -> Result<DecaySummary, ServiceError> {
        let mut summary = DecaySummary::default();
        for mut rumor in self.load_all()?.into_iter().filter(|r| !r.is_expired()) {
            summary.processed += 1;
            if let Some((decayed, expired)) = self.decay_step(&mut rumor, days_since_active) {
                summary.decayed += usize::from(decayed);
                summary.expired += usize::from(expired);
            }
        }
        Ok(summary)
    }

    /// Summarise rumors for narrative use
    ///
    /// With an entity: the rumors it knows, in its own wording, most believed
    /// first. Without: active rumors in their original wording, most severe
    /// and then newest first. Rumors failing validation are skipped.
    pub async fn get_rumor_context(&self, query: &ContextQuery) -> Result<Vec<RumorContextEntry>, ServiceError> {
        let min_believability = clamp_unit(query.min_believability);
        let store_query = RumorQuery {
            categories: query.categories.clone(),
            min_severity: query.min_severity,
            entity_id: query.entity_id.clone(),
            min_believability: query.entity_id.as_ref().map(|_| min_believability),
            ..RumorQuery::default()
        };
        let rumors = {
            let store = self.lock_store()?;
            store.get_rumors_by_filters(&store_query).map_err(store_error)?
        };

        let mut entries: Vec<(RumorContextEntry, u64)> = Vec::new();
        for rumor in &rumors {
            if let Err(reason) = rumor.validate() {
                warn!("Skipping broken rumor {}: {}", rumor.id(), reason);
                continue;
            }
            let (content, believability) = match &query.entity_id {
                Some(entity) => {
                    let (Some(believability), Some(content)) = (
                        rumor.believability_for_entity(entity),
                        rumor.current_content_for_entity(entity),
                    ) else {
                        continue;
                    };
                    (content, believability)
                }
                None => {
                    if rumor.is_expired() {
                        continue;
                    }
                    (rumor.original_content(), rumor.average_believability())
                }
            };
            if believability < min_believability {
                continue;
            }
            entries.push((
                RumorContextEntry {
                    rumor_id: rumor.id(),
                    content: content.to_string(),
                    believability,
                    truth_value: rumor.truth_value(),
                    severity: rumor.severity,
                    categories: rumor.categories().to_vec(),
                    spread_count: rumor.spread_count(),
                },
                rumor.created_at(),
            ));
        }

        if query.entity_id.is_some() {
            entries.sort_by(|a, b| b.0.believability.total_cmp(&a.0.believability));
        } else {
            entries.sort_by(|a, b| b.0.severity.cmp(&a.0.severity).then(b.1.cmp(&a.1)));
        }

        Ok(entries
            .into_iter()
            .take(query.num_rumors)
            .map(|(entry, _)| entry)
            .collect())
    }

    /// [`Self::get_rumor_context`] rendered as numbered lines of prose
    pub async fn rumor_context_text(&self, query: &ContextQuery) -> Result<String, ServiceError> {
        let entries = self.get_rumor_context(query).await?;
        Ok(render_rumor_context(query.entity_id.as_deref(), &entries))
    }

    /// Trace a variant back to the original and summarise how it drifted
    ///
    /// Kinds are read from each retelling's `mutation_types` metadata;
    /// retellings without it (word-level edits) add depth but no kinds.
    /// Returns `None` for an unknown rumor or variant.
    pub async fn analyze_mutation_chain(
        &self,
        rumor_id: RumorId,
        variant_id: VariantId,
    ) -> Result<Option<MutationChainReport>, ServiceError> {
        let Some(rumor) = self.load(rumor_id)? else {
            return Ok(None);
        };
        let Some(lineage) = rumor.lineage(variant_id) else {
            warn!("Variant {} not found in rumor {}", variant_id, rumor_id);
            return Ok(None);
        };

        let history: Vec<MutationKind> = lineage
            .iter()
            .filter_map(|variant| variant.mutation_metadata.get(MUTATION_TYPES_KEY))
            .flat_map(|kinds| kinds.split(',').filter_map(MutationKind::parse))
            .collect();
        let content = lineage[lineage.len() - 1].content.clone();

        Ok(Some(MutationChainReport {
            rumor_id,
            variant_id,
            depth: lineage.len() - 1,
            analysis: analyze_mutation_chain(&history),
            similarity_to_original: content_similarity(rumor.original_content(), &content),
            content,
        }))
    }

    /// Rumors whose original content resembles this one's
    ///
    /// Sorted most similar first. An unknown rumor yields an empty list.
    pub async fn find_similar_rumors(&self, rumor_id: RumorId, threshold: f64) -> Result<Vec<SimilarRumor>, ServiceError> {
        let rumors = self.load_all()?;
        let Some(target) = rumors.iter().find(|r| r.id() == rumor_id) else {
            debug!("No rumor {} to compare against", rumor_id);
            return Ok(Vec::new());
        };

        let mut similar: Vec<SimilarRumor> = rumors
            .iter()
            .filter(|r| r.id() != rumor_id)
            .filter_map(|r| {
                let similarity = content_similarity(target.original_content(), r.original_content());
                (similarity >= threshold).then(|| SimilarRumor {
                    rumor_id: r.id(),
                    content: r.original_content().to_string(),
                    similarity,
                })
            })
            .collect();
        similar.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(similar)
    }

    /// Shift an entity's believability by `adjustment`
    ///
    /// Returns false when the rumor is unknown or the entity has not heard it.
    pub async fn update_believability(
        &self,
        rumor_id: RumorId,
        entity_id: &str,
        adjustment: f64,
    ) -> Result<bool, ServiceError> {
        if !adjustment.is_finite() {
            return Err(ServiceError::InvalidArgument(format!("adjustment must be finite, got {}", adjustment)));
        }
        let applied = self.modify_rumor(rumor_id, |rumor| rumor.adjust_believability(entity_id, adjustment))?;
        match applied {
            Some((believability, _)) => {
                debug!("Believability of {} in rumor {} now {:.3}", entity_id, rumor_id, believability);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rumors matching a store query
    pub async fn query_rumors(&self, query: &RumorQuery) -> Result<Vec<Rumor>, ServiceError> {
        let store = self.lock_store()?;
        store.get_rumors_by_filters(query).map_err(store_error)
    }

    /// Rumors an entity knows, optionally filtered
    pub async fn rumors_for_entity(
        &self,
        entity_id: &str,
        categories: &[RumorCategory],
        min_believability: Option<f64>,
        limit: Option<usize>,
    ) -> Result<Vec<Rumor>, ServiceError> {
        let query = RumorQuery {
            categories: categories.to_vec(),
            entity_id: Some(entity_id.to_string()),
            min_believability,
            limit,
            ..RumorQuery::default()
        };
        self.query_rumors(&query).await
    }

    /// Aggregate figures over every stored rumor
    pub async fn statistics(&self) -> Result<RumorStatistics, ServiceError> {
        let rumors = self.load_all()?;
        let mut stats = RumorStatistics {
            total_rumors: rumors.len(),
            ..RumorStatistics::default()
        };
        if rumors.is_empty() {
            return Ok(stats);
        }

        let mut truth_sum = 0.0;
        let mut believability_sum = 0.0;
        for rumor in &rumors {
            if rumor.is_expired() {
                stats.expired_rumors += 1;
            } else {
                stats.active_rumors += 1;
            }
            stats.total_variants += rumor.variants().len();
            stats.total_spread_records += rumor.spread_count();
            for category in rumor.categories() {
                *stats.category_distribution.entry(category.as_str().to_string()).or_insert(0) += 1;
            }
            *stats
                .severity_distribution
                .entry(rumor.severity.as_str().to_string())
                .or_insert(0) += 1;
            truth_sum += rumor.truth_value();
            believability_sum += rumor.average_believability();
        }

        let count = rumors.len() as f64;
        stats.average_truth_value = truth_sum / count;
        stats.average_believability = believability_sum / count;
        stats.average_spread = stats.total_spread_records as f64 / count;
        Ok(stats)
    }

    /// Whether the entity believes the rumor enough to pass it on
    ///
    /// `None` when the rumor is unknown or the entity has not heard it.
    pub async fn will_pass_on(
        &self,
        rumor_id: RumorId,
        entity_id: &str,
        relationship_strength: f64,
        base_threshold: f64,
    ) -> Result<Option<bool>, ServiceError> {
        let Some(rumor) = self.load(rumor_id)? else {
            return Ok(None);
        };
        Ok(rumor.believability_for_entity(entity_id).map(|believability| {
            believability >= believability_threshold(base_threshold, rumor.severity, relationship_strength)
        }))
    }

    /// How many entities the rumor can plausibly have reached by now
    pub async fn estimated_reach(&self, rumor_id: RumorId, initial_radius: f64) -> Result<Option<u32>, ServiceError> {
        let Some(rumor) = self.load(rumor_id)? else {
            return Ok(None);
        };
        let days_active = current_timestamp().saturating_sub(rumor.created_at()) as f64 / SECONDS_PER_DAY as f64;
        Ok(Some(spread_radius(initial_radius, rumor.severity, days_active, DEFAULT_SATURATION)))
    }
}

/// Chance that a retelling mutates
///
/// An explicit probability wins. Otherwise the configured default applies as
/// is, or scaled by severity and spread count when the config opts in.
fn effective_mutation_probability(
    config: &ServiceConfig,
    explicit: Option<f64>,
    severity: RumorSeverity,
    spread_count: usize,
) -> f64 {
    match explicit {
        Some(probability) => probability,
        None if config.severity_scaled_mutation => {
            mutation_probability(config.default_mutation_probability, severity, spread_count)
        }
        None => config.default_mutation_probability,
    }
}

fn parse_category(raw: &str) -> RumorCategory {
    RumorCategory::parse(raw).unwrap_or_else(|| {
        warn!("Unknown rumor category '{}', using {}", raw, RumorCategory::Other);
        RumorCategory::Other
    })
}

fn parse_severity(raw: &str) -> RumorSeverity {
    RumorSeverity::parse(raw).unwrap_or_else(|| {
        warn!("Unknown rumor severity '{}', using {}", raw, RumorSeverity::default());
        RumorSeverity::default()
    })
}
