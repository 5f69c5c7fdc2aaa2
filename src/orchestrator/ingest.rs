//! Part accumulation and teardown detection.

use tokio::task::JoinHandle;

use super::ReportOrchestrator;
use crate::encoder::encode_line;
use crate::error::Result;
use crate::types::{EntityKind, Event, MetricRecord, RunId, RunStatus, TestId};

/// What one [`ReportOrchestrator::ingest_metrics`] batch did
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// One stored part per run that had samples in the batch, in first-seen order
    pub parts: Vec<(RunId, i64)>,
    /// One finalize job per teardown record in the batch
    pub finalize_jobs: Vec<JoinHandle<()>>,
}

impl ReportOrchestrator {
    /// Store one chunk of encoded content for a run
    ///
    /// Moves the report and then the test from `Starting` to `Running` (a no-op once
    /// they are running), then appends `content` as the run's next part.
    ///
    /// Returns the part's sequence number.
    pub async fn save_part_content(
        &self,
        report_id: &RunId,
        test_id: &TestId,
        content: &str,
    ) -> Result<i64> {
        self.mark_running(report_id, test_id).await?;

        let part = self.db.append_part(report_id, content).await?;
        tracing::debug!(
            report_id = %report_id,
            part,
            bytes = content.len(),
            "Stored report part"
        );

        self.emit_event(Event::PartAppended {
            report_id: report_id.clone(),
            part,
        });

        Ok(part)
    }

    /// Ingest a batch of metric records
    ///
    /// Records whose thread name contains the teardown marker trigger
    /// [`complete_report`](Self::complete_report) for their run. Every other record
    /// is encoded, and each run's lines are stored as a single part. Parts are
    /// stored before any completion is triggered.
    pub async fn ingest_metrics(&self, metrics: &[MetricRecord]) -> Result<IngestOutcome> {
        let marker = self.config.ingest.teardown_marker.as_str();

        let mut chunks: Vec<(RunId, TestId, String)> = Vec::new();
        let mut teardowns: Vec<&MetricRecord> = Vec::new();

        for metric in metrics {
            if metric.is_teardown(marker) {
                teardowns.push(metric);
                continue;
            }

            let line = encode_line(metric);
            match chunks.iter_mut().find(|(id, _, _)| *id == metric.report_id) {
                Some((_, _, content)) => content.push_str(&line),
                None => chunks.push((metric.report_id.clone(), metric.test_id.clone(), line)),
            }
        }

        let mut outcome = IngestOutcome::default();

        for (report_id, test_id, content) in chunks {
            let part = self.save_part_content(&report_id, &test_id, &content).await?;
            outcome.parts.push((report_id, part));
        }

        for metric in teardowns {
            outcome.finalize_jobs.push(self.complete_report(metric)?);
        }

        Ok(outcome)
    }

    /// Apply a compare-and-set transition, logging when it is a no-op
    /// Move the report and then the test from `Starting` to `Running`
    ///
    /// Either entity already past `Starting` is left as it is.
    pub(crate) async fn mark_running(&self, report_id: &RunId, test_id: &TestId) -> Result<()> {
        self.transition_run(
            EntityKind::Report,
            report_id.as_str(),
            RunStatus::Starting,
            RunStatus::Running,
        )
        .await?;
        self.transition_run(
            EntityKind::Test,
            test_id.as_str(),
            RunStatus::Starting,
            RunStatus::Running,
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn transition_run(
        &self,
        entity: EntityKind,
        id: &str,
        from: RunStatus,
        to: RunStatus,
    ) -> Result<bool> {
        let applied = self.db.transition_status(entity, id, from, to).await?;

        if applied {
            tracing::debug!(%entity, id, %from, %to, "Status advanced");
        } else {
            tracing::debug!(%entity, id, %from, %to, "Status transition not applied");
        }

        Ok(applied)
    }
}
