//! Rumormill Content Transformer
//!
//! Produces mutated retellings of rumors and estimates how much truth they
//! lost along the way.
//!
//! # Architecture
//!
//! ```text
//! TransformRequest → prompt → TextGenerator (blocking pool, timeout)
//!                                 │ ok            │ error / timeout / empty
//!                                 ▼               ▼
//!                          clean_response   fallback_transform
//!                                                 or mutate_with_strategies
//! ```
//!
//! With [`MutationMode::Strategies`] a [`MutationKind`] is drawn from the
//! teller's situation first and used to steer the prompt; the rule-based path
//! then applies typed rewrites instead of plain word edits.
//!
//! # Example Usage
//!
//! ```no_run
//! use rumormill_transformer::{ContentTransformer, TransformRequest, TransformerConfig};
//! use rumormill_llm::MockGenerator;
//!
//! # async fn example() {
//! let transformer = ContentTransformer::new(MockGenerator::new("The king is dead"), TransformerConfig::default());
//! let retold = transformer
//!     .transform(&TransformRequest::new("The king has a cold", "The king is ill", 0.6))
//!     .await;
//! println!("{}", retold);
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod fallback;
mod parser;
mod prompt;
mod strategy;
mod transformer;
mod truth;

pub use config::{MutationMode, TransformerConfig};
pub use error::TransformerError;
pub use fallback::{edit_budget, fallback_transform, mutate_words};
pub use parser::{clean_response, parse_score};
pub use prompt::{truth_prompt, DistortionLabel, MutationPromptBuilder};
pub use strategy::{
    analyze_mutation_chain, apply_mutation, attempt_count, mutate_with_strategies, mutation_weights,
    select_mutation_kind, MutationChainAnalysis, MutationKind, MutationSignals, StrategyOutcome,
};
pub use transformer::{ContentTransformer, TransformOutcome, TransformRequest, TransformSource};
pub use truth::{calculate_truth_value, content_similarity};
