//! Error table generator
//!
//! Groups failed samples by error type and reports each type's share of all
//! errors and of all samples.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use super::sample::{SampleLine, parse_content};
use super::{ReportGenerator, ReportOutput};
use crate::error::GenerationError;
use crate::types::RunId;

/// One row of the error table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    /// Response code, followed by `/message` when a failure message was recorded
    pub error_type: String,
    /// Failed samples of this type
    pub error_number: u64,
    /// Share of all failed samples, formatted as `"12.50%"`
    pub percent_of_errors: String,
    /// Share of all samples, formatted as `"12.50%"`
    pub percent_of_all_samples: String,
}

/// Built-in generator producing the error table (key `errors`)
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorsReport;

impl ErrorsReport {
    /// Build the table from parsed samples, most frequent type first
    pub fn summarize(samples: &[SampleLine]) -> Vec<ErrorEntry> {
        let total = samples.len() as u64;

        let mut by_type: HashMap<String, u64> = HashMap::new();
        for sample in samples.iter().filter(|s| s.is_failure()) {
            *by_type.entry(error_type(sample)).or_default() += 1;
        }
        let errors: u64 = by_type.values().sum();

        let mut entries: Vec<ErrorEntry> = by_type
            .into_iter()
            .map(|(error_type, count)| ErrorEntry {
                error_type,
                error_number: count,
                percent_of_errors: percent(count, errors),
                percent_of_all_samples: percent(count, total),
            })
            .collect();

        entries.sort_by(|a, b| {
            b.error_number
                .cmp(&a.error_number)
                .then_with(|| a.error_type.cmp(&b.error_type))
        });
        entries
    }
}

#[async_trait]
impl ReportGenerator for ErrorsReport {
    fn name(&self) -> &'static str {
        "errors"
    }

    async fn execute(
        &self,
        _report_id: &RunId,
        content: &str,
    ) -> Result<ReportOutput, GenerationError> {
        let parsed = parse_content(self.name(), content)?;
        ReportOutput::from_serializable(self.name(), &Self::summarize(&parsed.samples))
    }
}

fn error_type(sample: &SampleLine) -> String {
    match (sample.response_code.as_deref(), sample.failure_message.as_deref()) {
        (Some(code), Some(message)) => format!("{code}/{message}"),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => "unknown".to_string(),
    }
}

pub(crate) fn percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", part as f64 * 100.0 / whole as f64)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn sample(success: bool, code: &str, message: Option<&str>) -> SampleLine {
        SampleLine {
            success: Some(success),
            response_code: Some(code.to_string()),
            failure_message: message.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_summarize_groups_and_sorts_by_count() {
        let samples = vec![
            sample(true, "200", None),
            sample(true, "200", None),
            sample(true, "200", None),
            sample(true, "200", None),
            sample(false, "500", None),
            sample(false, "500", None),
            sample(false, "500", None),
            sample(false, "404", Some("missing")),
        ];

        let entries = ErrorsReport::summarize(&samples);

        assert_eq!(
            entries,
            vec![
                ErrorEntry {
                    error_type: "500".into(),
                    error_number: 3,
                    percent_of_errors: "75.00%".into(),
                    percent_of_all_samples: "37.50%".into(),
                },
                ErrorEntry {
                    error_type: "404/missing".into(),
                    error_number: 1,
                    percent_of_errors: "25.00%".into(),
                    percent_of_all_samples: "12.50%".into(),
                },
            ]
        );
    }

    #[test]
    fn test_summarize_ties_are_ordered_by_type() {
        let samples = vec![sample(false, "503", None), sample(false, "500", None)];
        let types: Vec<String> = ErrorsReport::summarize(&samples)
            .into_iter()
            .map(|e| e.error_type)
            .collect();
        assert_eq!(types, vec!["500", "503"]);
    }

    #[test]
    fn test_summarize_without_failures_is_empty() {
        assert!(ErrorsReport::summarize(&[sample(true, "200", None)]).is_empty());
        assert!(ErrorsReport::summarize(&[]).is_empty());
    }

    #[test]
    fn test_percent_of_zero_whole() {
        assert_eq!(percent(0, 0), "0.00%");
        assert_eq!(percent(1, 3), "33.33%");
    }

    #[tokio::test]
    async fn test_execute_serializes_camel_case_table() {
        let content = "1,,login,500,,,,false,timeout  at line2,,,,,,,,\n\
                       2,,login,200,,,,true,,,,,,,,,\n";

        let output = ErrorsReport
            .execute(&RunId::from("r-1"), content)
            .await
            .unwrap();

        assert_eq!(output.key, "errors");
        assert_eq!(
            output.content,
            serde_json::json!([{
                "errorType": "500/timeout  at line2",
                "errorNumber": 1,
                "percentOfErrors": "100.00%",
                "percentOfAllSamples": "50.00%"
            }])
        );
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_content() {
        let err = ErrorsReport
            .execute(&RunId::from("r-1"), "not,a,metric\n")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidContent { line: 1, .. }));
    }

    #[tokio::test]
    async fn test_execute_ignores_line_with_comma_in_label() {
        let content = "1,,login,500,,,,false,,,,,,,,,\n\
                       2,,GET /a,b,200,,,,true,,,,,,,,,\n\
                       3,,login,200,,,,true,,,,,,,,,\n";

        let output = ErrorsReport
            .execute(&RunId::from("r-1"), content)
            .await
            .unwrap();

        assert_eq!(output.content[0]["errorType"], "500");
        assert_eq!(output.content[0]["percentOfAllSamples"], "50.00%");
    }
}
