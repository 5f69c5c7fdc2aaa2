//! Test fixtures: orchestrators, seeded runs, and metric samples

use chrono::{TimeZone, Utc};
use loadtest_report::db::{NewLoadTest, NewReport};
use loadtest_report::{Config, GeneratorRegistry, MetricRecord, ReportOrchestrator, RunId, TestId};
use tempfile::TempDir;

/// Create an orchestrator on a fresh database. The tempdir must be kept alive.
pub async fn create_orchestrator(registry: GeneratorRegistry) -> (ReportOrchestrator, TempDir) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("loadtest-report.db");
    config.pools.finalize_pool_size = 2;
    config.pools.generator_pool_size = 4;

    let orchestrator = ReportOrchestrator::new(config, registry)
        .await
        .expect("create orchestrator");
    (orchestrator, temp_dir)
}

/// Insert a load test and one report for it, both in `Starting`
pub async fn seed_run(
    orchestrator: &ReportOrchestrator,
    report_id: &str,
    test_id: &str,
) -> (RunId, TestId) {
    let report_id = RunId::from(report_id);
    let test_id = TestId::from(test_id);

    orchestrator
        .db
        .insert_load_test(&NewLoadTest {
            id: test_id.clone(),
            name: format!("Checkout flow {test_id}"),
        })
        .await
        .expect("insert load test");
    orchestrator
        .db
        .insert_report(&NewReport {
            id: report_id.clone(),
            test_id: test_id.clone(),
            name: format!("Run {report_id}"),
        })
        .await
        .expect("insert report");

    (report_id, test_id)
}

/// A sample as the load generator would emit it
pub fn sample(report_id: &str, test_id: &str, seq: i64, success: bool) -> MetricRecord {
    let mut metric = MetricRecord::new(report_id, test_id);
    let start = 1_700_000_000_000 + seq * 1000;
    metric.timestamp = Utc.timestamp_millis_opt(start).single();
    metric.elapsed_time = Utc.timestamp_millis_opt(start + 250).single();
    metric.sample_label = Some("GET /checkout".to_string());
    metric.response_code = Some(if success { "200" } else { "500" }.to_string());
    metric.thread_name = Some("Thread Group 1-1".to_string());
    metric.data_type = Some("text".to_string());
    metric.success = Some(success);
    if !success {
        metric.failure_message = Some("Internal Server Error".to_string());
    }
    metric.bytes = Some(2048);
    metric.sent_bytes = Some(512);
    metric.grp_threads = Some(5);
    metric.all_threads = Some(10);
    metric.url = Some("https://shop.example.com/checkout".to_string());
    metric.latency = Some(120);
    metric.idle_time = Some(0);
    metric.connect_time = Some(15);
    metric.test_name = Some("Checkout flow".to_string());
    metric
}

/// The teardown sample that ends a run
pub fn teardown(report_id: &str, test_id: &str) -> MetricRecord {
    let mut metric = MetricRecord::new(report_id, test_id);
    metric.thread_name = Some("tearDown Thread Group 1-1".to_string());
    metric.test_name = Some("Checkout flow".to_string());
    metric
}
