//! Rumormill Janitor
//!
//! Background maintenance that ages rumors: each sweep runs one decay pass
//! over the rumor service, expiring rumors nobody believes any more.
//!
//! # Usage
//!
//! ## Background Worker
//!
//! ```no_run
//! use rumormill_janitor::{AppConfig, ConfiguredGenerator, DecayWorker};
//! use rumormill_service::{RumorService, TracingDispatcher};
//! use rumormill_store::SqliteStore;
//! use rumormill_transformer::ContentTransformer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_file("rumormill.toml")?;
//!     let service = RumorService::new(
//!         SqliteStore::new(&config.database.path)?,
//!         ContentTransformer::new(ConfiguredGenerator::from_config(&config.llm), config.transformer.clone()),
//!         TracingDispatcher,
//!         config.service.clone(),
//!     )?;
//!
//!     // Run indefinitely (until Ctrl+C)
//!     DecayWorker::new(config.janitor.clone()).run(&service).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use rumormill_janitor::JanitorConfig;
//!
//! // Hourly sweeps, one day of decay each
//! let config = JanitorConfig::default();
//!
//! // Rumors age fast
//! let config = JanitorConfig::aggressive();
//!
//! // Rumors linger
//! let config = JanitorConfig::lenient();
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod generator;
mod janitor;
mod metrics;
mod worker;

pub use config::{AppConfig, DatabaseConfig, JanitorConfig, LlmConfig, LlmProvider};
pub use error::JanitorError;
pub use generator::ConfiguredGenerator;
pub use janitor::DecayJanitor;
pub use metrics::JanitorMetrics;
pub use worker::DecayWorker;
