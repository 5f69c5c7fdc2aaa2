//! End-to-end tests driving the public API: ingest, teardown, fan-out, completion.

mod common;

use async_trait::async_trait;
use common::{
    WaitResult, assert_run_status, create_orchestrator, sample, seed_run, teardown,
    wait_for_completion,
};
use loadtest_report::encoder::encode_lines;
use loadtest_report::{
    GenerationError, GeneratorRegistry, MetricRecord, ReportGenerator, ReportOutput, RunId,
    RunStatus,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_three_chunks_then_teardown_completes_run() {
    let (orchestrator, _temp_dir) = create_orchestrator(GeneratorRegistry::with_builtin()).await;
    let (report_id, test_id) = seed_run(&orchestrator, "R1", "T1").await;
    assert_run_status(&orchestrator, "R1", "T1", RunStatus::Starting).await;

    let chunks: Vec<String> = (0..3)
        .map(|i| {
            let batch = [
                sample("R1", "T1", i * 2, true),
                sample("R1", "T1", i * 2 + 1, i != 1),
            ];
            encode_lines(&batch)
        })
        .collect();

    for (i, chunk) in chunks.iter().enumerate() {
        let part = orchestrator
            .save_part_content(&report_id, &test_id, chunk)
            .await
            .unwrap();
        assert_eq!(part, i as i64 + 1);
    }
    assert_run_status(&orchestrator, "R1", "T1", RunStatus::Running).await;

    let mut events = orchestrator.subscribe();
    let job = orchestrator.complete_report(&teardown("R1", "T1")).unwrap();

    match wait_for_completion(&mut events, &report_id, Duration::from_secs(10)).await {
        WaitResult::Completed => {}
        other => panic!("run did not complete: {other:?}"),
    }
    job.await.unwrap();

    assert_run_status(&orchestrator, "R1", "T1", RunStatus::Completed).await;
    assert_eq!(
        orchestrator.db.assemble_content(&report_id).await.unwrap(),
        chunks.concat()
    );

    let errors = orchestrator
        .db
        .get_report_result(&report_id, "errors")
        .await
        .unwrap()
        .expect("errors report stored");
    let errors: serde_json::Value = serde_json::from_str(&errors.content).unwrap();
    assert_eq!(
        errors,
        serde_json::json!([{
            "errorType": "500/Internal Server Error",
            "errorNumber": 1,
            "percentOfErrors": "100.00%",
            "percentOfAllSamples": "16.67%"
        }])
    );

    let overview = orchestrator
        .db
        .get_report_result(&report_id, "overview")
        .await
        .unwrap()
        .expect("overview report stored");
    let overview: serde_json::Value = serde_json::from_str(&overview.content).unwrap();
    assert_eq!(overview["totalSamples"], 6);
    assert_eq!(overview["errorCount"], 1);
    assert_eq!(overview["maxUsers"], 10);
    assert_eq!(overview["durationSeconds"], 5.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_streamed_json_metrics_are_ingested_and_reported() {
    let (orchestrator, _temp_dir) = create_orchestrator(GeneratorRegistry::with_builtin()).await;
    let (report_id, _) = seed_run(&orchestrator, "R2", "T2").await;
    let mut events = orchestrator.subscribe();

    let payload = r#"[
        {"reportId": "R2", "testId": "T2", "testName": "Checkout flow",
         "timestamp": 1700000000000, "elapsedTime": 1700000000250,
         "sampleLabel": "GET /", "responseCode": "200", "threadName": "Thread Group 1-1",
         "success": true, "allThreads": 3, "latency": 80},
        {"reportId": "R2", "testId": "T2",
         "timestamp": 1700000001000, "responseCode": "504", "threadName": "Thread Group 1-2",
         "success": false, "failureMessage": "gateway timeout,\nupstream", "allThreads": 4},
        {"reportId": "R2", "testId": "T2", "threadName": "tearDown Thread Group 1-1"}
    ]"#;
    let metrics: Vec<MetricRecord> = serde_json::from_str(payload).unwrap();

    let outcome = orchestrator.ingest_metrics(&metrics).await.unwrap();
    assert_eq!(outcome.parts, vec![(RunId::from("R2"), 1)]);
    assert_eq!(outcome.finalize_jobs.len(), 1);

    match wait_for_completion(&mut events, &report_id, Duration::from_secs(10)).await {
        WaitResult::Completed => {}
        other => panic!("run did not complete: {other:?}"),
    }
    assert_run_status(&orchestrator, "R2", "T2", RunStatus::Completed).await;

    let content = orchestrator.db.assemble_content(&report_id).await.unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains(",gateway timeout upstream,"), "{content}");

    let errors = orchestrator
        .db
        .get_report_result(&report_id, "errors")
        .await
        .unwrap()
        .expect("errors report stored");
    let errors: serde_json::Value = serde_json::from_str(&errors.content).unwrap();
    assert_eq!(errors[0]["errorType"], "504/gateway timeout upstream");
    assert_eq!(errors[0]["percentOfAllSamples"], "50.00%");
}

struct CountingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ReportGenerator for CountingGenerator {
    fn name(&self) -> &'static str {
        "line_count"
    }

    async fn execute(
        &self,
        _report_id: &RunId,
        content: &str,
    ) -> Result<ReportOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ReportOutput::from_serializable(self.name(), &content.lines().count())
    }
}

struct BrokenGenerator;

#[async_trait]
impl ReportGenerator for BrokenGenerator {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn execute(
        &self,
        _report_id: &RunId,
        _content: &str,
    ) -> Result<ReportOutput, GenerationError> {
        Err(GenerationError::failed(self.name(), "not today"))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_custom_generators_and_failures_still_complete() {
    let counting = Arc::new(CountingGenerator {
        calls: AtomicUsize::new(0),
    });
    let registry = GeneratorRegistry::new(vec![
        counting.clone() as Arc<dyn ReportGenerator>,
        Arc::new(BrokenGenerator),
    ]);
    let (orchestrator, _temp_dir) = create_orchestrator(registry).await;
    let (report_id, test_id) = seed_run(&orchestrator, "R3", "T3").await;

    orchestrator
        .save_part_content(&report_id, &test_id, "a\nb\n")
        .await
        .unwrap();
    orchestrator
        .save_part_content(&report_id, &test_id, "c\n")
        .await
        .unwrap();

    let summary = orchestrator
        .finalize_report(&report_id, &test_id)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, vec!["line_count"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].generator(), "broken");
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert_run_status(&orchestrator, "R3", "T3", RunStatus::Completed).await;

    let stored = orchestrator
        .db
        .list_report_results(&report_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].report_key, "line_count");
    assert_eq!(stored[0].content, "3");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_teardown_without_content_reports_empty_run() {
    let (orchestrator, _temp_dir) = create_orchestrator(GeneratorRegistry::with_builtin()).await;
    let (report_id, _) = seed_run(&orchestrator, "R4", "T4").await;

    let job = orchestrator.complete_report(&teardown("R4", "T4")).unwrap();
    job.await.unwrap();

    assert_run_status(&orchestrator, "R4", "T4", RunStatus::Completed).await;
    let stored = orchestrator
        .db
        .list_report_results(&report_id)
        .await
        .unwrap();
    let keys: Vec<&str> = stored.iter().map(|r| r.report_key.as_str()).collect();
    assert_eq!(keys, vec!["errors", "overview"]);

    let overview: serde_json::Value = serde_json::from_str(&stored[1].content).unwrap();
    assert_eq!(overview["totalSamples"], 0);
}
