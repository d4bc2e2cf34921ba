//! Rumormill Service
//!
//! Orchestrates the rumor lifecycle over an injected store, transformer and
//! event dispatcher: creation, spreading with optional mutation,
//! reinforcement, decay and narrative summaries.
//!
//! # Example Usage
//!
//! ```no_run
//! use rumormill_llm::MockGenerator;
//! use rumormill_service::{ContextQuery, CreateRumor, NoopDispatcher, RumorService, ServiceConfig, SpreadRequest};
//! use rumormill_store::SqliteStore;
//! use rumormill_transformer::{ContentTransformer, TransformerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RumorService::new(
//!     SqliteStore::in_memory()?,
//!     ContentTransformer::new(MockGenerator::default(), TransformerConfig::default()),
//!     NoopDispatcher,
//!     ServiceConfig::default(),
//! )?;
//!
//! let id = service
//!     .create_rumor(CreateRumor::new("npc_1", "The king is ill").severity("major"))
//!     .await?;
//! service.spread_rumor(SpreadRequest::new(id, "npc_1", "npc_2")).await?;
//! println!("{}", service.rumor_context_text(&ContextQuery::for_entity("npc_2")).await?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod events;
mod service;
mod types;

pub use config::ServiceConfig;
pub use context::render_rumor_context;
pub use error::ServiceError;
pub use events::{ChannelDispatcher, DispatchError, NoopDispatcher, TracingDispatcher};
pub use service::RumorService;
pub use types::{
    ContextQuery, CreateRumor, DecaySummary, MutationChainReport, MutationContext, RumorContextEntry,
    RumorStatistics, SimilarRumor, SpreadRequest, DEFAULT_TRUTH_VALUE,
};
