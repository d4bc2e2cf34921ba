//! Core content transformer

use crate::config::{MutationMode, TransformerConfig};
use crate::error::TransformerError;
use crate::fallback::fallback_transform;
use crate::parser::{clean_response, parse_score};
use crate::prompt::{truth_prompt, MutationPromptBuilder};
use crate::strategy::{mutate_with_strategies, select_mutation_kind, MutationKind, MutationSignals};
use crate::truth::calculate_truth_value;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rumormill_domain::{clamp_unit, TextGenerator};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// What to retell and how hard to distort it
#[derive(Debug, Clone, Default)]
pub struct TransformRequest {
    /// The real event the rumor started from
    pub original_event: String,

    /// Wording being passed on
    pub current_text: String,

    /// Personality traits of the teller
    pub traits: Vec<String>,

    /// How much drift to allow, in [0, 1]
    pub distortion_level: f64,

    /// Optional slant (e.g. "more sinister")
    pub direction: Option<String>,

    /// Teller's mood, e.g. "angry"
    pub emotional_state: Option<String>,

    /// Pressure to have something worth telling, in [0, 1]; 0.5 when unknown
    pub social_pressure: Option<f64>,

    /// Days since the rumor started
    pub days_since_original: f64,

    /// Retellings between the original and `current_text`
    pub chain_depth: usize,
}

impl TransformRequest {
    /// Request a retelling of `current_text` at `distortion_level`
    pub fn new(original_event: impl Into<String>, current_text: impl Into<String>, distortion_level: f64) -> Self {
        Self {
            original_event: original_event.into(),
            current_text: current_text.into(),
            distortion_level,
            ..Self::default()
        }
    }

    /// Situation used to pick mutation strategies
    pub fn signals(&self) -> MutationSignals<'_> {
        MutationSignals {
            traits: &self.traits,
            emotional_state: self.emotional_state.as_deref(),
            social_pressure: clamp_unit(self.social_pressure.unwrap_or(0.5)),
            days_since_original: self.days_since_original,
            chain_depth: self.chain_depth,
        }
    }
}

/// Which path produced a retelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformSource {
    /// Distortion below the no-op threshold
    Unchanged,
    /// Text generator answered in time
    Generated,
    /// Rule-based mutation after a generator failure
    Fallback,
}

impl TransformSource {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformSource::Unchanged => "unchanged",
            TransformSource::Generated => "generated",
            TransformSource::Fallback => "fallback",
        }
    }
}

/// Result of a retelling
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    /// The retold rumor
    pub text: String,
    /// How it was produced
    pub source: TransformSource,
    /// Strategy kinds behind the text; empty for word-level edits
    pub mutations: Vec<MutationKind>,
}

/// Turns one wording of a rumor into a mutated retelling
///
/// The generator is an unreliable collaborator: every call is bounded by the
/// configured timeout and any failure falls back to the rule-based mutation.
pub struct ContentTransformer<G>
where
    G: TextGenerator,
{
    generator: Arc<G>,
    config: TransformerConfig,
    generation_timeout: Duration,
    rng: Mutex<StdRng>,
}

impl<G> ContentTransformer<G>
where
    G: TextGenerator + Send + Sync + 'static,
    G::Error: std::fmt::Display,
{
    /// Create a new transformer
    pub fn new(generator: G, config: TransformerConfig) -> Self {
        Self {
            generator: Arc::new(generator),
            generation_timeout: config.generation_timeout(),
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seed the fallback's random source for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Override the generation timeout with sub-second precision
    pub fn with_generation_timeout(mut self, generation_timeout: Duration) -> Self {
        self.generation_timeout = generation_timeout;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Retell a rumor
    ///
    /// Never fails: below the no-op threshold the text comes back unchanged,
    /// and any generator problem is answered by [`Self::fallback`].
    pub async fn transform(&self, request: &TransformRequest) -> String {
        self.transform_detailed(request).await.text
    }

    /// Retell a rumor and report which path produced the text
    pub async fn transform_detailed(&self, request: &TransformRequest) -> TransformOutcome {
        let level = clamp_unit(request.distortion_level);
        if level < self.config.no_op_threshold {
            return TransformOutcome {
                text: request.current_text.clone(),
                source: TransformSource::Unchanged,
                mutations: Vec::new(),
            };
        }

        let requested_kind = match self.config.mutation_mode {
            MutationMode::WordEdit => None,
            MutationMode::Strategies => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                Some(select_mutation_kind(&request.signals(), level, &mut *rng))
            }
        };

        let prompt = MutationPromptBuilder::new(&request.original_event, &request.current_text, level)
            .with_traits(&request.traits, self.config.max_prompt_traits)
            .with_direction(request.direction.as_deref())
            .with_mutation_kind(requested_kind)
            .build();
        debug!("Mutation prompt length: {} chars", prompt.len());

        let generated = self
            .call_generator(prompt)
            .await
            .and_then(|raw| {
                let cleaned = clean_response(&raw);
                if cleaned.is_empty() {
                    Err(TransformerError::EmptyResponse)
                } else {
                    Ok(cleaned)
                }
            });

        match generated {
            Ok(text) => TransformOutcome {
                text,
                source: TransformSource::Generated,
                mutations: requested_kind.into_iter().collect(),
            },
            Err(e) => {
                warn!("Text generation failed, using rule-based mutation: {}", e);
                match self.config.mutation_mode {
                    MutationMode::WordEdit => TransformOutcome {
                        text: self.fallback(&request.current_text, level),
                        source: TransformSource::Fallback,
                        mutations: Vec::new(),
                    },
                    MutationMode::Strategies => {
                        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                        let outcome = mutate_with_strategies(
                            &request.current_text,
                            &request.signals(),
                            level,
                            self.config.fallback_threshold,
                            &mut *rng,
                        );
                        debug!(applied = outcome.applied.len(), "Strategy mutation applied");
                        TransformOutcome {
                            text: outcome.text,
                            source: TransformSource::Fallback,
                            mutations: outcome.applied,
                        }
                    }
                }
            }
        }
    }

    /// Rule-based mutation using the transformer's random source
    pub fn fallback(&self, text: &str, distortion_level: f64) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        fallback_transform(text, distortion_level, self.config.fallback_threshold, &mut *rng)
    }

    /// Estimate a retelling's truth value with the heuristic formula
    pub fn calculate_truth_value(&self, original_event: &str, transformed: &str, base_truth: f64) -> f64 {
        calculate_truth_value(original_event, transformed, base_truth)
    }

    /// Ask the generator to score a retelling's truthfulness
    ///
    /// The score is capped at `base_truth`. Falls back to the heuristic when
    /// generation fails or the answer contains no usable number.
    pub async fn evaluate_truthfulness(&self, original_event: &str, transformed: &str, base_truth: f64) -> f64 {
        let base = clamp_unit(base_truth);
        let scored = self
            .call_generator(truth_prompt(original_event, transformed))
            .await
            .and_then(|raw| parse_score(&raw).ok_or(TransformerError::InvalidScore(raw)));

        match scored {
            Ok(score) => score.min(base),
            Err(e) => {
                debug!("Truthfulness scoring unavailable, using heuristic: {}", e);
                calculate_truth_value(original_event, transformed, base)
            }
        }
    }

    /// Call the generator on the blocking pool, bounded by the timeout
    async fn call_generator(&self, prompt: String) -> Result<String, TransformerError> {
        let generator = Arc::clone(&self.generator);

        // TextGenerator is synchronous
        let task = tokio::task::spawn_blocking(move || {
            generator
                .generate(&prompt)
                .map_err(|e| TransformerError::Generation(e.to_string()))
        });

        match timeout(self.generation_timeout, task).await {
            Err(_) => Err(TransformerError::Timeout(self.generation_timeout)),
            Ok(Err(join_error)) => Err(TransformerError::Generation(format!("Task join error: {}", join_error))),
            Ok(Ok(result)) => result,
        }
    }
}
