//! Shared test helpers for creating ReportOrchestrator instances in tests.

use crate::config::Config;
use crate::db::{Database, NewLoadTest, NewReport};
use crate::error::GenerationError;
use crate::generator::{GeneratorRegistry, ReportGenerator, ReportOutput};
use crate::orchestrator::ReportOrchestrator;
use crate::types::{RunId, TestId};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

/// How a [`ScriptedGenerator`] behaves in `execute`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Behavior {
    Succeed,
    Fail,
    Panic,
    /// Wait for [`ScriptedGenerator::release`] before succeeding
    Block,
}

/// Generator that counts its calls and behaves as scripted
pub(crate) struct ScriptedGenerator {
    name: &'static str,
    behavior: Behavior,
    inits: AtomicUsize,
    executes: AtomicUsize,
    finished: AtomicUsize,
    release: Notify,
}

impl ScriptedGenerator {
    pub(crate) fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            inits: AtomicUsize::new(0),
            executes: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            release: Notify::new(),
        })
    }

    /// Let a blocked `execute` finish
    pub(crate) fn release(&self) {
        self.release.notify_one();
    }

    pub(crate) fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub(crate) fn executes(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub(crate) fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&self, _report_id: &RunId, _content: &str) -> Result<(), GenerationError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn execute(
        &self,
        _report_id: &RunId,
        content: &str,
    ) -> Result<ReportOutput, GenerationError> {
        self.executes.fetch_add(1, Ordering::SeqCst);

        let result = match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(GenerationError::failed(self.name, "scripted failure")),
            Behavior::Panic => panic!("scripted panic in {}", self.name),
            Behavior::Block => {
                self.release.notified().await;
                Ok(())
            }
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        result?;

        Ok(ReportOutput {
            key: self.name.to_string(),
            content: serde_json::json!({ "content": content }),
        })
    }
}

/// Build a registry from scripted generators, keeping concrete handles for assertions
pub(crate) fn registry_of(generators: &[Arc<ScriptedGenerator>]) -> GeneratorRegistry {
    GeneratorRegistry::new(
        generators
            .iter()
            .map(|g| Arc::clone(g) as Arc<dyn ReportGenerator>)
            .collect(),
    )
}

/// Config with small pools, rooted in a fresh temp directory
pub(crate) fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.pools.finalize_pool_size = 2;
    config.pools.generator_pool_size = 4;
    config.pools.shutdown_timeout = Duration::from_secs(5);
    config
}

/// Helper to create a test ReportOrchestrator with a persistent database.
/// Returns the orchestrator and the tempdir (which must be kept alive).
pub(crate) async fn create_test_orchestrator(
    registry: GeneratorRegistry,
) -> (ReportOrchestrator, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let orchestrator = ReportOrchestrator::new(config, registry).await.unwrap();
    (orchestrator, temp_dir)
}

/// Same as [`create_test_orchestrator`] with a caller-adjusted config
pub(crate) async fn create_test_orchestrator_with(
    registry: GeneratorRegistry,
    adjust: impl FnOnce(&mut Config),
) -> (ReportOrchestrator, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    adjust(&mut config);
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    let orchestrator = ReportOrchestrator::with_database(config, registry, Arc::new(db)).unwrap();
    (orchestrator, temp_dir)
}

/// Insert a test and its report, both in `Starting`
pub(crate) async fn seed_run(
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
            name: format!("test {}", test_id),
        })
        .await
        .unwrap();
    orchestrator
        .db
        .insert_report(&NewReport {
            id: report_id.clone(),
            test_id: test_id.clone(),
            name: format!("report {}", report_id),
        })
        .await
        .unwrap();

    (report_id, test_id)
}
