//! Generator output per run.

use crate::error::DatabaseError;
use crate::types::RunId;
use crate::{Error, Result};

use super::{Database, ReportResult};

impl Database {
    /// Store a generator's output for a run, replacing any previous output under the same key
    pub async fn save_report_result(
        &self,
        report_id: &RunId,
        report_key: &str,
        content: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO load_test_report_results (report_id, report_key, content, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(report_id, report_key) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(report_id)
        .bind(report_key)
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to save report result: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get one generator's output for a run
    pub async fn get_report_result(
        &self,
        report_id: &RunId,
        report_key: &str,
    ) -> Result<Option<ReportResult>> {
        let row = sqlx::query_as::<_, ReportResult>(
            r#"
            SELECT report_id, report_key, content, updated_at
            FROM load_test_report_results
            WHERE report_id = ? AND report_key = ?
            "#,
        )
        .bind(report_id)
        .bind(report_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get report result: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List every generator output stored for a run, ordered by key
    pub async fn list_report_results(&self, report_id: &RunId) -> Result<Vec<ReportResult>> {
        let rows = sqlx::query_as::<_, ReportResult>(
            r#"
            SELECT report_id, report_key, content, updated_at
            FROM load_test_report_results
            WHERE report_id = ?
            ORDER BY report_key ASC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list report results: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
