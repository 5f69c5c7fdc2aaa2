//! One generator bound to one run's content.

use std::sync::Arc;

use super::{ReportGenerator, ReportOutput};
use crate::error::GenerationError;
use crate::types::RunId;

/// Unit of work for a single generator in a single fan-out cycle
///
/// Created fresh per cycle; the content is shared between every task of the
/// cycle without copying.
#[derive(Clone)]
pub struct GeneratorTask {
    generator: Arc<dyn ReportGenerator>,
    report_id: RunId,
    content: Arc<str>,
}

impl GeneratorTask {
    /// Bind `generator` to a run and its assembled content
    pub fn new(generator: Arc<dyn ReportGenerator>, report_id: RunId, content: Arc<str>) -> Self {
        Self {
            generator,
            report_id,
            content,
        }
    }

    /// Name of the bound generator
    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Run this task's report
    pub fn report_id(&self) -> &RunId {
        &self.report_id
    }

    /// Run `init` then `execute`
    pub async fn run(&self) -> Result<ReportOutput, GenerationError> {
        self.generator.init(&self.report_id, &self.content)?;
        self.generator.execute(&self.report_id, &self.content).await
    }
}

impl std::fmt::Debug for GeneratorTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorTask")
            .field("generator", &self.generator.name())
            .field("report_id", &self.report_id)
            .field("content_len", &self.content.len())
            .finish()
    }
}
