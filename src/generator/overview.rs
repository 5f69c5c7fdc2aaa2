//! Run overview generator.

use async_trait::async_trait;
use serde::Serialize;

use super::errors::percent;
use super::sample::{SampleLine, parse_content};
use super::{ReportGenerator, ReportOutput};
use crate::error::GenerationError;
use crate::types::RunId;

/// Headline numbers for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Number of samples
    pub total_samples: u64,
    /// Number of failed samples
    pub error_count: u64,
    /// Failed share of all samples, formatted as `"12.50%"`
    pub error_percentage: String,
    /// Mean latency over samples that recorded one, in milliseconds
    pub average_latency: Option<f64>,
    /// Highest all-groups thread gauge seen
    pub max_users: Option<i64>,
    /// Seconds between the first and last sample timestamps
    pub duration_seconds: f64,
    /// Samples per second over `duration_seconds` (None for a zero-length run)
    pub throughput: Option<f64>,
    /// Content lines left out because they did not parse
    pub skipped_lines: usize,
}

/// Built-in generator producing the run overview (key `overview`)
#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewReport;

impl OverviewReport {
    /// Compute the overview from parsed samples
    pub fn summarize(samples: &[SampleLine]) -> Overview {
        let total_samples = samples.len() as u64;
        let error_count = samples.iter().filter(|s| s.is_failure()).count() as u64;

        let latencies: Vec<i64> = samples.iter().filter_map(|s| s.latency).collect();
        let average_latency = (!latencies.is_empty())
            .then(|| latencies.iter().sum::<i64>() as f64 / latencies.len() as f64);

        let max_users = samples.iter().filter_map(|s| s.all_threads).max();

        let first = samples.iter().filter_map(|s| s.timestamp).min();
        let last = samples.iter().filter_map(|s| s.timestamp).max();
        let duration_seconds = match (first, last) {
            (Some(first), Some(last)) => (last - first) as f64 / 1000.0,
            _ => 0.0,
        };
        let throughput =
            (duration_seconds > 0.0).then(|| total_samples as f64 / duration_seconds);

        Overview {
            total_samples,
            error_count,
            error_percentage: percent(error_count, total_samples),
            average_latency,
            max_users,
            duration_seconds,
            throughput,
            skipped_lines: 0,
        }
    }
}

#[async_trait]
impl ReportGenerator for OverviewReport {
    fn name(&self) -> &'static str {
        "overview"
    }

    async fn execute(
        &self,
        _report_id: &RunId,
        content: &str,
    ) -> Result<ReportOutput, GenerationError> {
        let parsed = parse_content(self.name(), content)?;
        let overview = Overview {
            skipped_lines: parsed.skipped,
            ..Self::summarize(&parsed.samples)
        };
        ReportOutput::from_serializable(self.name(), &overview)
    }
}
