//! Custom test assertions for integration tests

use loadtest_report::{EntityKind, Event, ReportOrchestrator, RunId, RunStatus};
use std::time::Duration;

/// Result of waiting for a run to finish
#[derive(Debug)]
pub enum WaitResult {
    /// Run reached `Completed`
    Completed,
    /// The finalize job gave up on the run
    Abandoned(String),
    /// Timeout waiting for completion
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait on an event stream until `report_id` completes or is abandoned
pub async fn wait_for_completion(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    report_id: &RunId,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::Completed { report_id: id, .. }) if id == *report_id => {
                    return WaitResult::Completed;
                }
                Ok(Event::GenerationAbandoned {
                    report_id: id,
                    reason,
                }) if id == *report_id => {
                    return WaitResult::Abandoned(reason);
                }
                Ok(_) => continue,
                Err(_) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Assert both entities of a run are in `expected`
pub async fn assert_run_status(
    orchestrator: &ReportOrchestrator,
    report_id: &str,
    test_id: &str,
    expected: RunStatus,
) {
    let report = orchestrator
        .db
        .get_status(EntityKind::Report, report_id)
        .await
        .expect("read report status");
    let test = orchestrator
        .db
        .get_status(EntityKind::Test, test_id)
        .await
        .expect("read test status");

    assert_eq!(report, Some(expected), "report {report_id} status");
    assert_eq!(test, Some(expected), "test {test_id} status");
}
