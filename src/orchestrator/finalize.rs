//! Completion signal, run claim, and status finalization.

use std::sync::atomic::Ordering;

use tokio::task::JoinHandle;

use super::{GenerationSummary, ReportOrchestrator};
use crate::error::{Error, Result};
use crate::types::{EntityKind, Event, MetricRecord, RunId, RunStatus, TestId};

impl ReportOrchestrator {
    /// Handle a teardown metric: finalize its run in the background
    ///
    /// Submits one finalize job to the finalize pool and returns without waiting
    /// for it. The returned handle resolves when the job ends; dropping it does not
    /// cancel the job. The job's outcome is logged and broadcast as events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has started.
    pub fn complete_report(&self, metric: &MetricRecord) -> Result<JoinHandle<()>> {
        if !self.pools.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let report_id = metric.report_id.clone();
        let test_id = metric.test_id.clone();
        tracing::info!(
            report_id = %report_id,
            test_id = %test_id,
            test_name = metric.test_name.as_deref().unwrap_or(""),
            "Test teardown received"
        );

        let orchestrator = self.clone();
        let finalize_pool = self.pools.finalize.clone();

        Ok(self.pools.finalize_jobs.spawn(async move {
            let _permit = match finalize_pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!(
                        report_id = %report_id,
                        "Finalize pool closed, run not reported"
                    );
                    return;
                }
            };

            if let Err(e) = orchestrator.finalize_report(&report_id, &test_id).await {
                tracing::warn!(
                    report_id = %report_id,
                    error = %e,
                    "Finalize job ended without completing run"
                );
            }
        }))
    }

    /// Finalize one run in the calling task
    ///
    /// 1. Moves a report and test still in `Starting` to `Running`, then claims the
    ///    run by moving the report from `Running` to `Reporting` and the test after it
    /// 2. Runs every registered generator and waits for all of them
    /// 3. Moves the report and then the test to `Completed`
    ///
    /// The test entity is advanced by a separate update after the report; a test
    /// that is not in the expected status is logged and broadcast but does not stop
    /// the run.
    ///
    /// # Errors
    ///
    /// - [`Error::TransitionConflict`] if the report was already past `Running`
    ///   (another job claimed it). No generator runs.
    /// - [`Error::SynchronizationInterrupted`] / [`Error::GenerationTimeout`] if the
    ///   join did not complete. The run stays in `Reporting`.
    pub async fn finalize_report(
        &self,
        report_id: &RunId,
        test_id: &TestId,
    ) -> Result<GenerationSummary> {
        // A run whose teardown arrives before any content is reported over empty content
        self.mark_running(report_id, test_id).await?;

        let claimed = self
            .transition_run(
                EntityKind::Report,
                report_id.as_str(),
                RunStatus::Running,
                RunStatus::Reporting,
            )
            .await?;
        if !claimed {
            return Err(self
                .transition_conflict(
                    EntityKind::Report,
                    report_id.as_str(),
                    RunStatus::Running,
                    RunStatus::Reporting,
                )
                .await);
        }

        self.advance_test(test_id, RunStatus::Running, RunStatus::Reporting)
            .await?;

        tracing::info!(report_id = %report_id, test_id = %test_id, "Test reporting");
        self.emit_event(Event::Reporting {
            report_id: report_id.clone(),
            test_id: test_id.clone(),
        });

        let summary = match self.generate_report(report_id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(
                    report_id = %report_id,
                    error = %e,
                    "Report generation abandoned, run left in Reporting"
                );
                self.emit_event(Event::GenerationAbandoned {
                    report_id: report_id.clone(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let completed = self
            .transition_run(
                EntityKind::Report,
                report_id.as_str(),
                RunStatus::Reporting,
                RunStatus::Completed,
            )
            .await?;
        if !completed {
            return Err(self
                .transition_conflict(
                    EntityKind::Report,
                    report_id.as_str(),
                    RunStatus::Reporting,
                    RunStatus::Completed,
                )
                .await);
        }

        self.advance_test(test_id, RunStatus::Reporting, RunStatus::Completed)
            .await?;

        tracing::info!(
            report_id = %report_id,
            test_id = %test_id,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Test completed"
        );
        self.emit_event(Event::Completed {
            report_id: report_id.clone(),
            test_id: test_id.clone(),
        });

        Ok(summary)
    }

    /// Advance the test entity; a conflict is reported but does not fail the run
    async fn advance_test(&self, test_id: &TestId, from: RunStatus, to: RunStatus) -> Result<()> {
        let applied = self
            .transition_run(EntityKind::Test, test_id.as_str(), from, to)
            .await?;
        if !applied {
            let conflict = self
                .transition_conflict(EntityKind::Test, test_id.as_str(), from, to)
                .await;
            tracing::debug!(error = %conflict, "Continuing with report despite test status");
        }
        Ok(())
    }

    /// Build (and report) the error for a transition that did not apply
    async fn transition_conflict(
        &self,
        entity: EntityKind,
        id: &str,
        expected: RunStatus,
        target: RunStatus,
    ) -> Error {
        let actual = match self.db.get_status(entity, id).await {
            Ok(actual) => actual,
            Err(e) => {
                tracing::debug!(
                    %entity,
                    id,
                    error = %e,
                    "Could not read status for conflict report"
                );
                None
            }
        };

        tracing::warn!(
            %entity,
            id,
            %expected,
            %target,
            actual = actual.map_or("no record", |s| s.as_str()),
            "Status transition conflict"
        );
        self.emit_event(Event::TransitionConflict {
            entity,
            id: id.to_string(),
            expected,
            target,
        });

        Error::TransitionConflict {
            entity,
            id: id.to_string(),
            expected,
            target,
            actual,
        }
    }
}
