
use crate::db::*;
use crate::types::{RunId, TestId};

/// Insert a test and its report, both in `Starting`.
pub(super) async fn seed_run(db: &Database, report_id: &str, test_id: &str) -> (RunId, TestId) {
    let test_id = TestId::from(test_id);
    let report_id = RunId::from(report_id);

    db.insert_load_test(&NewLoadTest {
        id: test_id.clone(),
        name: format!("test {}", test_id),
    })
    .await
    .unwrap();
    db.insert_report(&NewReport {
        id: report_id.clone(),
        test_id: test_id.clone(),
        name: format!("report {}", report_id),
    })
    .await
    .unwrap();

    (report_id, test_id)
}
