//! Parsing encoded lines back into typed samples
//!
//! The inverse of [`encode_line`](crate::encoder::encode_line), used by the
//! built-in generators. Empty columns parse as `None`. The response-message
//! column is always empty in encoded content and is skipped.

use crate::encoder::COLUMN_COUNT;
use crate::error::GenerationError;
use thiserror::Error;

/// Why a single line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSampleError {
    /// The line did not split into the expected number of columns
    #[error("expected {COLUMN_COUNT} columns, found {0}")]
    ColumnCount(usize),

    /// A numeric or boolean column held something else
    #[error("column {column} has invalid value {value:?}")]
    InvalidValue {
        /// Column name as in [`HEADER`](crate::encoder::HEADER)
        column: &'static str,
        /// The raw text
        value: String,
    },
}

/// One encoded metric line, parsed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleLine {
    /// Epoch-millis start time
    pub timestamp: Option<i64>,
    /// Minutes and seconds of the end time, as seconds
    pub elapsed: Option<u32>,
    /// Sampler label
    pub label: Option<String>,
    /// Response code
    pub response_code: Option<String>,
    /// Thread name
    pub thread_name: Option<String>,
    /// Data type tag
    pub data_type: Option<String>,
    /// Success flag
    pub success: Option<bool>,
    /// Sanitized failure message
    pub failure_message: Option<String>,
    /// Received bytes
    pub bytes: Option<i64>,
    /// Sent bytes
    pub sent_bytes: Option<i64>,
    /// Active threads in the group
    pub grp_threads: Option<i64>,
    /// Active threads overall
    pub all_threads: Option<i64>,
    /// Target URL
    pub url: Option<String>,
    /// Latency in milliseconds
    pub latency: Option<i64>,
    /// Idle time in milliseconds
    pub idle_time: Option<i64>,
    /// Connect time in milliseconds
    pub connect_time: Option<i64>,
}

impl SampleLine {
    /// Parse one line (with or without its trailing newline)
    pub fn parse(line: &str) -> Result<Self, ParseSampleError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let columns: Vec<&str> = line.split(',').collect();
        if columns.len() != COLUMN_COUNT {
            return Err(ParseSampleError::ColumnCount(columns.len()));
        }

        Ok(Self {
            timestamp: number(columns[0], "timeStamp")?,
            elapsed: number(columns[1], "elapsed")?,
            label: text(columns[2]),
            response_code: text(columns[3]),
            thread_name: text(columns[5]),
            data_type: text(columns[6]),
            success: number(columns[7], "success")?,
            failure_message: text(columns[8]),
            bytes: number(columns[9], "bytes")?,
            sent_bytes: number(columns[10], "sentBytes")?,
            grp_threads: number(columns[11], "grpThreads")?,
            all_threads: number(columns[12], "allThreads")?,
            url: text(columns[13]),
            latency: number(columns[14], "Latency")?,
            idle_time: number(columns[15], "IdleTime")?,
            connect_time: number(columns[16], "Connect")?,
        })
    }

    /// Whether the sample is a failure (an explicit `false` success flag)
    pub fn is_failure(&self) -> bool {
        self.success == Some(false)
    }
}

/// Samples recovered from a run's content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedContent {
    /// Lines that parsed, in content order
    pub samples: Vec<SampleLine>,
    /// Non-blank lines that did not parse and were left out
    pub skipped: usize,
}

/// Parse every non-blank line of `content` on behalf of `generator`
///
/// A line that does not parse (a label carrying a comma adds a column) is logged
/// and skipped.
///
/// # Errors
///
/// Returns [`GenerationError::InvalidContent`] naming the first bad line (1-based)
/// when the content has lines but none of them parse.
pub fn parse_content(generator: &str, content: &str) -> Result<ParsedContent, GenerationError> {
    let mut parsed = ParsedContent::default();
    let mut first_error = None;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match SampleLine::parse(line) {
            Ok(sample) => parsed.samples.push(sample),
            Err(e) => {
                tracing::warn!(
                    generator,
                    line = index + 1,
                    error = %e,
                    "Skipping unparseable sample line"
                );
                parsed.skipped += 1;
                first_error.get_or_insert((index + 1, e));
            }
        }
    }

    if let Some((line, e)) = first_error.filter(|_| parsed.samples.is_empty()) {
        return Err(GenerationError::InvalidContent {
            generator: generator.to_string(),
            line,
            reason: e.to_string(),
        });
    }

    Ok(parsed)
}

fn text(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

fn number<T: std::str::FromStr>(
    raw: &str,
    column: &'static str,
) -> Result<Option<T>, ParseSampleError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ParseSampleError::InvalidValue {
            column,
            value: raw.to_string(),
        })
}
