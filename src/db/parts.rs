//! Ordered content parts per run.
//!
//! Sequence numbers are assigned as `count of existing parts + 1` inside a single
//! `INSERT ... SELECT`, which SQLite executes under its write lock, so concurrent
//! appends to the same run cannot observe the same count. The `(report_id, part)`
//! primary key backs this up.

use crate::error::DatabaseError;
use crate::types::RunId;
use crate::{Error, Result};

use super::{Database, ReportPart};

impl Database {
    /// Append a content part to a run and return its sequence number (1-based)
    pub async fn append_part(&self, report_id: &RunId, content: &str) -> Result<i64> {
        let part: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO load_test_report_details (report_id, part, content)
            SELECT ?, COUNT(*) + 1, ?
            FROM load_test_report_details
            WHERE report_id = ?
            RETURNING part
            "#,
        )
        .bind(report_id)
        .bind(content)
        .bind(report_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to append part for report {}: {}",
                report_id, e
            )))
        })?;

        Ok(part)
    }

    /// Count the parts stored for a run
    pub async fn count_parts(&self, report_id: &RunId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM load_test_report_details WHERE report_id = ?")
                .bind(report_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to count parts: {}",
                        e
                    )))
                })?;

        Ok(count)
    }

    /// List a run's parts ordered by sequence number
    pub async fn list_parts(&self, report_id: &RunId) -> Result<Vec<ReportPart>> {
        let rows = sqlx::query_as::<_, ReportPart>(
            r#"
            SELECT report_id, part, content
            FROM load_test_report_details
            WHERE report_id = ?
            ORDER BY part ASC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list parts: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Concatenate a run's parts in sequence order, with no separator
    ///
    /// Returns an empty string if the run has no parts.
    pub async fn assemble_content(&self, report_id: &RunId) -> Result<String> {
        let parts = self.list_parts(report_id).await?;

        let mut content = String::with_capacity(parts.iter().map(|p| p.content.len()).sum());
        for part in &parts {
            content.push_str(&part.content);
        }

        Ok(content)
    }
}
