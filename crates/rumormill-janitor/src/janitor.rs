//! One decay sweep over the rumor service

use crate::{JanitorConfig, JanitorError, JanitorMetrics};
use rumormill_domain::{EventDispatcher, RumorStore, TextGenerator};
use rumormill_service::{DecaySummary, RumorService};
use std::fmt::Display;
use std::time::Instant;
use tracing::{error, info};

/// Applies periodic decay and keeps running totals
///
/// # Examples
///
/// ```no_run
/// use rumormill_janitor::DecayJanitor;
/// use rumormill_llm::MockGenerator;
/// use rumormill_service::{RumorService, ServiceConfig, TracingDispatcher};
/// use rumormill_store::SqliteStore;
/// use rumormill_transformer::{ContentTransformer, TransformerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = RumorService::new(
///     SqliteStore::new("rumormill.db")?,
///     ContentTransformer::new(MockGenerator::default(), TransformerConfig::default()),
///     TracingDispatcher,
///     ServiceConfig::default(),
/// )?;
/// let mut janitor = DecayJanitor::default_config();
///
/// let summary = janitor.sweep(&service).await?;
/// println!("expired {}", summary.expired);
/// println!("{}", janitor.metrics().summary());
/// # Ok(())
/// # }
/// ```
pub struct DecayJanitor {
    config: JanitorConfig,
    metrics: JanitorMetrics,
}

impl DecayJanitor {
    /// Create a new janitor with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        Self {
            config,
            metrics: JanitorMetrics::new(),
        }
    }

    /// Create a janitor with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Current configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Run one decay pass covering `days_per_sweep` days
    ///
    /// In dry-run mode nothing is saved and only the sweep itself is
    /// counted; the returned summary says what would have changed.
    pub async fn sweep<S, G, D>(&mut self, service: &RumorService<S, G, D>) -> Result<DecaySummary, JanitorError>
    where
        S: RumorStore,
        S::Error: Display,
        G: TextGenerator + Send + Sync + 'static,
        G::Error: Display,
        D: EventDispatcher,
        D::Error: Display,
    {
        let start = Instant::now();
        let days = self.config.days_per_sweep;

        let result = if self.config.dry_run {
            service.preview_decay(days).await.inspect(|summary| {
                info!(
                    "DRY RUN: would decay {} and expire {} of {} active rumors",
                    summary.decayed, summary.expired, summary.processed
                );
            })
        } else {
            service.decay_all_rumors(days).await
        };

        match result {
            Ok(summary) => {
                if !self.config.dry_run {
                    self.metrics.record_decay(&summary);
                }
                self.metrics.record_sweep(start.elapsed());
                Ok(summary)
            }
            Err(e) => {
                error!("Decay sweep failed: {}", e);
                self.metrics.record_failure();
                Err(e.into())
            }
        }
    }
}
