//! Shutdown coordination.

use std::sync::atomic::Ordering;

use crate::error::Result;

use super::ReportOrchestrator;

impl ReportOrchestrator {
    /// Gracefully shut down the orchestrator
    ///
    /// 1. Stops accepting completion signals ([`complete_report`](Self::complete_report)
    ///    returns [`Error::ShuttingDown`](crate::Error::ShuttingDown))
    /// 2. Waits up to `pools.shutdown_timeout` for in-flight finalize jobs
    /// 3. On timeout, interrupts every pending join; those runs stay in `Reporting`
    ///
    /// Ingestion of content parts is unaffected.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new completion signals
        self.pools.accepting_new.store(false, Ordering::SeqCst);
        self.pools.finalize_jobs.close();
        tracing::info!(
            in_flight = self.pools.finalize_jobs.len(),
            "Stopped accepting completion signals"
        );

        // 2. Wait for in-flight finalize jobs with timeout
        let shutdown_timeout = self.config.pools.shutdown_timeout;
        let wait_result =
            tokio::time::timeout(shutdown_timeout, self.pools.finalize_jobs.wait()).await;

        match wait_result {
            Ok(()) => {
                tracing::info!("All finalize jobs completed gracefully");
            }
            Err(_) => {
                // 3. Interrupt joins that are still waiting on generators
                tracing::warn!(
                    timeout = ?shutdown_timeout,
                    remaining = self.pools.finalize_jobs.len(),
                    "Timeout waiting for finalize jobs, interrupting pending joins"
                );
                self.pools.interrupt.cancel();
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether completion signals are still accepted
    pub fn is_accepting(&self) -> bool {
        self.pools.accepting_new.load(Ordering::SeqCst)
    }
}
