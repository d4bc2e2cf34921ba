//! Background worker for continuous janitor operation

use crate::{DecayJanitor, JanitorConfig, JanitorError, JanitorMetrics};
use rumormill_domain::{EventDispatcher, RumorStore, TextGenerator};
use rumormill_service::RumorService;
use std::fmt::Display;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs [`DecayJanitor`] sweeps on a schedule
///
/// The first sweep happens immediately; later ones follow the configured
/// interval. A slow sweep delays the next tick rather than causing a burst.
pub struct DecayWorker {
    janitor: DecayJanitor,
    interval: Duration,
}

impl DecayWorker {
    /// Create a new background worker with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        let interval = config.sweep_interval();
        Self {
            janitor: DecayJanitor::new(config),
            interval,
        }
    }

    /// Create a worker with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Override the sweep interval with sub-minute precision
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until a shutdown signal (Ctrl+C) is received
    ///
    /// Failed sweeps are logged and retried on the next tick.
    pub async fn run<S, G, D>(&mut self, service: &RumorService<S, G, D>) -> Result<(), JanitorError>
    where
        S: RumorStore,
        S::Error: Display,
        G: TextGenerator + Send + Sync + 'static,
        G::Error: Display,
        D: EventDispatcher,
        D::Error: Display,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Decay worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting sweep cycle");
                    if let Ok(summary) = self.janitor.sweep(service).await {
                        tracing::info!(
                            "Sweep completed: {} processed, {} decayed, {} expired, {} errors",
                            summary.processed,
                            summary.decayed,
                            summary.expired,
                            summary.errors
                        );
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping decay worker");
                    break;
                }
            }
        }

        tracing::info!("Decay worker stopped. Final metrics:\n{}", self.janitor.metrics().summary());
        Ok(())
    }

    /// Run a fixed number of sweeps, stopping at the first failure
    pub async fn run_cycles<S, G, D>(
        &mut self,
        service: &RumorService<S, G, D>,
        cycles: usize,
    ) -> Result<(), JanitorError>
    where
        S: RumorStore,
        S::Error: Display,
        G: TextGenerator + Send + Sync + 'static,
        G::Error: Display,
        D: EventDispatcher,
        D::Error: Display,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);
            self.janitor.sweep(service).await?;
        }

        tracing::info!(
            "Decay worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.janitor.metrics().summary()
        );
        Ok(())
    }

    /// Get a reference to the janitor's current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        self.janitor.metrics()
    }

    /// Reset the janitor's metrics counters
    pub fn reset_metrics(&mut self) {
        self.janitor.reset_metrics();
    }
}
