//! Traits and types for report generators

use crate::error::GenerationError;
use crate::types::RunId;
use async_trait::async_trait;
use serde::Serialize;

/// Output of one generator for one run
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutput {
    /// Key the output is stored under (normally the generator's name)
    pub key: String,
    /// Generator-specific JSON document
    pub content: serde_json::Value,
}

impl ReportOutput {
    /// Build an output by serializing `value`
    pub fn from_serializable<T: Serialize>(
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self, GenerationError> {
        let key = key.into();
        let content = serde_json::to_value(value)
            .map_err(|e| GenerationError::failed(key.clone(), format!("serialize output: {e}")))?;
        Ok(Self { key, content })
    }
}

/// Trait for report generators
///
/// Implementations compute one report (an error table, an overview, ...) from the
/// run's assembled content. Every generator sees the same content. A failure in
/// one generator never affects the others.
///
/// Implementations must be `Send + Sync`: the same instance is shared by every
/// run and may be executing for several runs at once.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use loadtest_report::{GenerationError, ReportGenerator, ReportOutput, RunId};
///
/// struct LineCount;
///
/// #[async_trait]
/// impl ReportGenerator for LineCount {
///     fn name(&self) -> &'static str {
///         "line_count"
///     }
///
///     async fn execute(
///         &self,
///         _report_id: &RunId,
///         content: &str,
///     ) -> Result<ReportOutput, GenerationError> {
///         ReportOutput::from_serializable(self.name(), &content.lines().count())
///     }
/// }
/// ```
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Stable name, used as the stored output key and in logs and events
    fn name(&self) -> &'static str;

    /// Prepare for one generation cycle
    ///
    /// Called exactly once per cycle, before [`execute`](Self::execute), on the
    /// generator's task. The default does nothing.
    ///
    /// # Errors
    ///
    /// An error here skips `execute` and counts as this generator's failure.
    fn init(&self, _report_id: &RunId, _content: &str) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Compute the report
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the content cannot be processed.
    async fn execute(
        &self,
        report_id: &RunId,
        content: &str,
    ) -> Result<ReportOutput, GenerationError>;
}
