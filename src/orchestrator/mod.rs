//! Report generation orchestration split into focused submodules.
//!
//! The `ReportOrchestrator` struct and its methods are organized by stage:
//! - [`ingest`] - Part accumulation and teardown detection
//! - [`finalize`] - Completion signal, run claim, and status finalization
//! - [`fanout`] - Parallel generator dispatch and the join on every generator
//! - [`barrier`] - Countdown barrier used by the join
//! - [`lifecycle`] - Shutdown coordination

pub mod barrier;
mod fanout;
mod finalize;
mod ingest;
mod lifecycle;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use fanout::{GenerationSummary, GeneratorOutcome};
pub use ingest::IngestOutcome;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::generator::GeneratorRegistry;
use crate::types::Event;

/// Bounded worker pools and finalize-job tracking
#[derive(Clone)]
pub(crate) struct WorkerPools {
    /// Limits finalize jobs running at once (pools.finalize_pool_size)
    pub(crate) finalize: Arc<Semaphore>,
    /// Limits generator tasks running at once across all runs (pools.generator_pool_size)
    pub(crate) generator: Arc<Semaphore>,
    /// Every spawned finalize job, so shutdown can wait for them
    pub(crate) finalize_jobs: TaskTracker,
    /// Flag to indicate whether completion signals are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancelled when shutdown gives up waiting; interrupts every pending join
    pub(crate) interrupt: CancellationToken,
}

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ReportOrchestrator {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query run status
    pub db: Arc<Database>,
    /// Generators invoked for every run
    pub(crate) registry: Arc<GeneratorRegistry>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Worker pools
    pub(crate) pools: WorkerPools,
}

impl ReportOrchestrator {
    /// Create a new ReportOrchestrator
    ///
    /// Validates the configuration, opens (or creates) the SQLite database at
    /// `persistence.database_path`, and sizes both worker pools from `pools`.
    pub async fn new(config: Config, registry: GeneratorRegistry) -> Result<Self> {
        config.validate()?;
        let db = Database::new(&config.persistence.database_path).await?;
        Self::with_database(config, registry, Arc::new(db))
    }

    /// Create an orchestrator on an already opened database
    pub fn with_database(
        config: Config,
        registry: GeneratorRegistry,
        db: Arc<Database>,
    ) -> Result<Self> {
        config.validate()?;

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = broadcast::channel(1000);

        let pools = WorkerPools {
            finalize: Arc::new(Semaphore::new(config.pools.finalize_pool_size)),
            generator: Arc::new(Semaphore::new(config.pools.generator_pool_size)),
            finalize_jobs: TaskTracker::new(),
            accepting_new: Arc::new(AtomicBool::new(true)),
            interrupt: CancellationToken::new(),
        };

        tracing::info!(
            generators = ?registry.names(),
            finalize_pool_size = config.pools.finalize_pool_size,
            generator_pool_size = config.pools.generator_pool_size,
            "Report orchestrator initialized"
        );

        Ok(Self {
            db,
            registry: Arc::new(registry),
            event_tx,
            config: Arc::new(config),
            pools,
        })
    }

    /// Subscribe to run lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls more than 1000 events behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Having no subscribers is not an error.
    pub(crate) fn emit_event(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    /// Current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Generators invoked for every run
    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }
}
