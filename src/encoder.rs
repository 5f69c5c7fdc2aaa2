//! Metric-to-line canonicalization
//!
//! Converts one [`MetricRecord`] into one CSV-style line in the column layout
//! downstream analytics expect:
//!
//! ```text
//! timeStamp,elapsed,label,responseCode,responseMessage,threadName,dataType,success,
//! failureMessage,bytes,sentBytes,grpThreads,allThreads,URL,Latency,IdleTime,Connect
//! ```
//!
//! Values are never quoted. The failure message is the only free-text column that is
//! sanitized: newlines are removed and commas become spaces, so each record yields
//! exactly one line with a stable column count. Missing fields become empty columns.

use crate::types::MetricRecord;
use chrono::{DateTime, Timelike, Utc};
use std::fmt::{Display, Write};

/// Number of columns in an encoded line
pub const COLUMN_COUNT: usize = 17;

/// Column names, in encoding order
pub const HEADER: &str = "timeStamp,elapsed,label,responseCode,responseMessage,threadName,dataType,success,failureMessage,bytes,sentBytes,grpThreads,allThreads,URL,Latency,IdleTime,Connect";

/// Encode one metric as a newline-terminated line
pub fn encode_line(metric: &MetricRecord) -> String {
    let mut line = String::with_capacity(128);

    push_opt(&mut line, metric.timestamp.map(|t| t.timestamp_millis()));
    push_opt(&mut line, metric.elapsed_time.as_ref().map(elapsed_within_hour));
    push_opt(&mut line, metric.sample_label.as_deref());
    push_opt(&mut line, metric.response_code.as_deref());
    // response message is always empty
    line.push(',');
    push_opt(&mut line, metric.thread_name.as_deref());
    push_opt(&mut line, metric.data_type.as_deref());
    push_opt(&mut line, metric.success);
    push_opt(
        &mut line,
        metric.failure_message.as_deref().map(sanitize_failure_message),
    );
    push_opt(&mut line, metric.bytes);
    push_opt(&mut line, metric.sent_bytes);
    push_opt(&mut line, metric.grp_threads);
    push_opt(&mut line, metric.all_threads);
    push_opt(&mut line, metric.url.as_deref().map(strip_whitespace));
    push_opt(&mut line, metric.latency);
    push_opt(&mut line, metric.idle_time);
    if let Some(connect) = metric.connect_time {
        let _ = write!(line, "{connect}");
    }
    line.push('\n');

    line
}

/// Encode a batch of metrics into one content chunk
pub fn encode_lines<'a>(metrics: impl IntoIterator<Item = &'a MetricRecord>) -> String {
    metrics.into_iter().map(encode_line).collect()
}

/// Remove every `\n` and replace every `,` with a space
pub fn sanitize_failure_message(message: &str) -> String {
    message
        .chars()
        .filter(|&c| c != '\n')
        .map(|c| if c == ',' { ' ' } else { c })
        .collect()
}

/// `minutes * 60 + seconds` of the end time.
///
/// The hour is dropped, so a sample ending at 02:15:47 encodes as 947.
pub fn elapsed_within_hour(end: &DateTime<Utc>) -> u32 {
    end.minute() * 60 + end.second()
}

/// Strip all whitespace from a URL; blank URLs become empty
fn strip_whitespace(url: &str) -> String {
    url.chars().filter(|c| !c.is_whitespace()).collect()
}

fn push_opt<T: Display>(line: &mut String, value: Option<T>) {
    if let Some(value) = value {
        let _ = write!(line, "{value}");
    }
    line.push(',');
}
