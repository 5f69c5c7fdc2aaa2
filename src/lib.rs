//! # loadtest-report
//!
//! Report generation engine for streamed load-test metrics.
//!
//! Metric samples arrive in chunks while a load test runs. Each chunk is encoded
//! into canonical CSV-style lines and stored as the next numbered part of its run.
//! When the test's teardown sample arrives, the run is handed to a bounded pool of
//! finalize jobs. A finalize job reassembles the run's content in part order and
//! fans it out to every registered [`ReportGenerator`]. It waits for all of them to
//! finish, successfully or not, and then marks the run `Completed`.
//!
//! ## Run lifecycle
//!
//! Both the load test and its report move through
//! `Starting -> Running -> Reporting -> Completed`. Every step is a compare-and-set
//! update that names the status it expects to replace, so repeated or concurrent
//! signals for the same run are no-ops rather than double transitions.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loadtest_report::{Config, GeneratorRegistry, MetricRecord, ReportOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator =
//!         ReportOrchestrator::new(Config::default(), GeneratorRegistry::with_builtin()).await?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Feed samples as they arrive; a teardown sample triggers report generation
//!     let batch: Vec<MetricRecord> = serde_json::from_str("[]")?;
//!     orchestrator.ingest_metrics(&batch).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Metric-to-line encoding
pub mod encoder;
/// Error types
pub mod error;
/// Report generators and their registry
pub mod generator;
/// Report generation orchestration (decomposed into focused submodules)
pub mod orchestrator;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, IngestConfig, PersistenceConfig, PoolConfig};
pub use db::Database;
pub use error::{DatabaseError, Error, GenerationError, Result};
pub use generator::{
    ErrorsReport, GeneratorRegistry, GeneratorTask, OverviewReport, ReportGenerator, ReportOutput,
};
pub use orchestrator::{GenerationSummary, GeneratorOutcome, IngestOutcome, ReportOrchestrator};
pub use types::{EntityKind, Event, MetricRecord, RunId, RunStatus, TestId};

/// Wait for SIGTERM or Ctrl+C, then shut the orchestrator down.
///
/// Completion signals are refused from then on and in-flight finalize jobs get
/// `pools.shutdown_timeout` to finish (see [`ReportOrchestrator::shutdown`]).
/// SIGTERM is only watched on Unix; if its handler cannot be registered, Ctrl+C
/// alone ends the wait.
///
/// # Example
///
/// ```no_run
/// use loadtest_report::{Config, GeneratorRegistry, ReportOrchestrator, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator =
///         ReportOrchestrator::new(Config::default(), GeneratorRegistry::with_builtin()).await?;
///
///     run_with_shutdown(orchestrator).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(orchestrator: ReportOrchestrator) -> Result<()> {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "Stopping report generation");
    orchestrator.shutdown().await
}

/// Resolve with the name of the signal that ended the wait
async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for Ctrl+C only");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
            "SIGINT"
        }
        _ = terminate => "SIGTERM",
    }
}
