//! Database layer for loadtest-report
//!
//! Handles SQLite persistence for tests, reports, report parts, and generator output.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`runs`] - Test and report entities, guarded status transitions
//! - [`parts`] - Ordered content parts per run
//! - [`results`] - Generator output per run

use crate::types::{RunId, RunStatus, TestId};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod parts;
mod results;
mod runs;

/// New load test to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewLoadTest {
    /// Primary key
    pub id: TestId,
    /// Display name
    pub name: String,
}

/// Load test record from database
#[derive(Debug, Clone, FromRow)]
pub struct LoadTest {
    /// Primary key
    pub id: TestId,
    /// Display name
    pub name: String,
    /// Current run status
    pub status: RunStatus,
    /// Unix timestamp (millis) when the test was created
    pub created_at: i64,
    /// Unix timestamp (millis) of the last status change
    pub updated_at: i64,
}

/// New report (one run of a test) to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewReport {
    /// Primary key; also the run identifier
    pub id: RunId,
    /// Test this report belongs to
    pub test_id: TestId,
    /// Display name
    pub name: String,
}

/// Report record from database
#[derive(Debug, Clone, FromRow)]
pub struct LoadTestReport {
    /// Primary key; also the run identifier
    pub id: RunId,
    /// Test this report belongs to
    pub test_id: TestId,
    /// Display name
    pub name: String,
    /// Current run status
    pub status: RunStatus,
    /// Unix timestamp (millis) when the report was created
    pub created_at: i64,
    /// Unix timestamp (millis) of the last status change
    pub updated_at: i64,
}

/// One ordered fragment of a run's accumulated content
#[derive(Debug, Clone, FromRow)]
pub struct ReportPart {
    /// Run this part belongs to
    pub report_id: RunId,
    /// Sequence number, 1-based and contiguous per run
    pub part: i64,
    /// Raw content
    pub content: String,
}

/// Stored output of one generator for one run
#[derive(Debug, Clone, FromRow)]
pub struct ReportResult {
    /// Run the output belongs to
    pub report_id: RunId,
    /// Generator key (see [`ReportGenerator::name`](crate::generator::ReportGenerator::name))
    pub report_key: String,
    /// JSON-encoded output
    pub content: String,
    /// Unix timestamp (millis) when the output was written
    pub updated_at: i64,
}

/// Database handle for loadtest-report
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
