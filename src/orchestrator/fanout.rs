//! Parallel generator dispatch and the join on every generator.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc;

use super::ReportOrchestrator;
use super::barrier::JoinBarrier;
use crate::error::{Error, GenerationError, Result};
use crate::generator::{GeneratorTask, ReportOutput};
use crate::types::{Event, RunId};

/// Result of one generator in one cycle
#[derive(Debug, Clone)]
pub struct GeneratorOutcome {
    /// Generator name
    pub generator: String,
    /// `Ok` once the output is stored
    pub result: std::result::Result<(), GenerationError>,
}

/// Per-generator results of one completed fan-out cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationSummary {
    /// Generators whose output was stored, in completion order
    pub succeeded: Vec<String>,
    /// Generators that failed, in completion order
    #[serde(serialize_with = "serialize_errors")]
    pub failed: Vec<GenerationError>,
}

impl GenerationSummary {
    /// Whether every generator succeeded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, outcome: GeneratorOutcome) {
        match outcome.result {
            Ok(()) => self.succeeded.push(outcome.generator),
            Err(e) => self.failed.push(e),
        }
    }
}

fn serialize_errors<S: serde::Serializer>(
    errors: &[GenerationError],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

impl ReportOrchestrator {
    /// Run every registered generator over the run's assembled content
    ///
    /// One task per generator is spawned onto the generator pool. Every task counts
    /// the join barrier down exactly once, whatever its outcome, and this method
    /// returns only after all of them have. Generator failures (including panics)
    /// are isolated: they are logged, broadcast, and listed in the summary.
    ///
    /// Does not change run status; see [`finalize_report`](Self::finalize_report).
    ///
    /// # Errors
    ///
    /// - [`Error::Database`] if the content cannot be assembled
    /// - [`Error::GenerationTimeout`] if `pools.join_timeout` elapses first
    /// - [`Error::SynchronizationInterrupted`] if shutdown interrupts the wait
    pub async fn generate_report(&self, report_id: &RunId) -> Result<GenerationSummary> {
        let content: Arc<str> = Arc::from(self.db.assemble_content(report_id).await?);
        let generators = self.registry.list_generators();

        tracing::info!(
            report_id = %report_id,
            generators = generators.len(),
            content_bytes = content.len(),
            "Dispatching report generators"
        );

        let (mut barrier, guards) = JoinBarrier::new(generators.len());
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        for (generator, guard) in generators.iter().zip(guards) {
            let task = GeneratorTask::new(
                Arc::clone(generator),
                report_id.clone(),
                Arc::clone(&content),
            );
            let orchestrator = self.clone();
            let generator_pool = self.pools.generator.clone();
            let outcome_tx = outcome_tx.clone();

            tokio::spawn(async move {
                // Counts down when this task ends, including by panic
                let _guard = guard;

                let result = match generator_pool.acquire_owned().await {
                    Ok(_permit) => orchestrator.run_generator(&task).await,
                    Err(_) => Err(GenerationError::PoolClosed {
                        generator: task.generator_name().to_string(),
                    }),
                };

                orchestrator.report_outcome(&task, &result);
                let _ = outcome_tx.send(GeneratorOutcome {
                    generator: task.generator_name().to_string(),
                    result,
                });
            });
        }
        drop(outcome_tx);

        self.join(report_id, &mut barrier).await?;

        let mut summary = GenerationSummary::default();
        while let Ok(outcome) = outcome_rx.try_recv() {
            summary.record(outcome);
        }

        tracing::info!(
            report_id = %report_id,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "All report generators finished"
        );

        Ok(summary)
    }

    /// Run one generator and store its output
    async fn run_generator(
        &self,
        task: &GeneratorTask,
    ) -> std::result::Result<(), GenerationError> {
        let name = task.generator_name();

        let output: ReportOutput = match AssertUnwindSafe(task.run()).catch_unwind().await {
            Ok(result) => result?,
            Err(payload) => {
                return Err(GenerationError::Panicked {
                    generator: name.to_string(),
                    message: panic_message(payload.as_ref()),
                });
            }
        };

        self.db
            .save_report_result(task.report_id(), &output.key, &output.content.to_string())
            .await
            .map_err(|e| GenerationError::Persist {
                generator: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn report_outcome(
        &self,
        task: &GeneratorTask,
        result: &std::result::Result<(), GenerationError>,
    ) {
        let report_id = task.report_id().clone();
        let generator = task.generator_name().to_string();

        match result {
            Ok(()) => {
                tracing::debug!(
                    report_id = %report_id,
                    generator = %generator,
                    "Report generator finished"
                );
                self.emit_event(Event::GeneratorCompleted {
                    report_id,
                    generator,
                });
            }
            Err(e) => {
                tracing::warn!(
                    report_id = %report_id,
                    generator = %generator,
                    error = %e,
                    "Report generator failed"
                );
                self.emit_event(Event::GeneratorFailed {
                    report_id,
                    generator,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Wait on the barrier, bounded by the join deadline and by shutdown
    async fn join(&self, report_id: &RunId, barrier: &mut JoinBarrier) -> Result<()> {
        let interrupt = self.pools.interrupt.clone();

        let waited = match self.config.pools.join_timeout {
            Some(timeout) => {
                let waited =
                    tokio::time::timeout(timeout, wait_or_interrupt(barrier, &interrupt)).await;
                match waited {
                    Ok(waited) => waited,
                    Err(_) => {
                        return Err(Error::GenerationTimeout {
                            report_id: report_id.to_string(),
                            timeout,
                            pending: barrier.remaining(),
                        });
                    }
                }
            }
            None => wait_or_interrupt(barrier, &interrupt).await,
        };

        waited.map_err(|reason| Error::SynchronizationInterrupted {
            report_id: report_id.to_string(),
            reason,
        })
    }
}

async fn wait_or_interrupt(
    barrier: &mut JoinBarrier,
    interrupt: &tokio_util::sync::CancellationToken,
) -> std::result::Result<(), String> {
    tokio::select! {
        waited = barrier.wait() => waited.map_err(|e| e.to_string()),
        _ = interrupt.cancelled() => {
            Err("orchestrator shut down before generators finished".to_string())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
