//! Test and report entities and their guarded status transitions.
//!
//! Status updates are compare-and-set: an update names the status it expects to
//! replace and only applies if the row still holds it. The test and the report are
//! separate rows updated by separate statements; callers advance both.

use crate::error::DatabaseError;
use crate::types::{EntityKind, RunId, RunStatus, TestId};
use crate::{Error, Result};

use super::{Database, LoadTest, LoadTestReport, NewLoadTest, NewReport};

impl Database {
    /// Insert a new load test in `Starting`
    pub async fn insert_load_test(&self, test: &NewLoadTest) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO load_tests (id, name, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&test.id)
        .bind(&test.name)
        .bind(RunStatus::Starting)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error("load test", e))?;

        Ok(())
    }

    /// Get a load test by ID
    pub async fn get_load_test(&self, id: &TestId) -> Result<Option<LoadTest>> {
        let row = sqlx::query_as::<_, LoadTest>(
            r#"
            SELECT id, name, status, created_at, updated_at
            FROM load_tests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get load test: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Insert a new report in `Starting`
    pub async fn insert_report(&self, report: &NewReport) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO load_test_reports (id, test_id, name, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.test_id)
        .bind(&report.name)
        .bind(RunStatus::Starting)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error("report", e))?;

        Ok(())
    }

    /// Get a report by ID
    pub async fn get_report(&self, id: &RunId) -> Result<Option<LoadTestReport>> {
        let row = sqlx::query_as::<_, LoadTestReport>(
            r#"
            SELECT id, test_id, name, status, created_at, updated_at
            FROM load_test_reports
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get report: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Read the current status of a test or report
    ///
    /// Returns None if the entity does not exist.
    pub async fn get_status(&self, entity: EntityKind, id: &str) -> Result<Option<RunStatus>> {
        let query = format!("SELECT status FROM {} WHERE id = ?", entity.table());

        let status = sqlx::query_scalar::<_, RunStatus>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get {} status: {}",
                    entity, e
                )))
            })?;

        Ok(status)
    }

    /// Move an entity from `from` to `to` if it is currently in `from`
    ///
    /// Returns `true` if the row was updated, `false` if the entity was missing or
    /// held a different status. Only `status` and `updated_at` are written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if `from -> to` is not a lifecycle edge.
    pub async fn transition_status(
        &self,
        entity: EntityKind,
        id: &str,
        from: RunStatus,
        to: RunStatus,
    ) -> Result<bool> {
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { from, to });
        }

        let now = chrono::Utc::now().timestamp_millis();
        let query = format!(
            "UPDATE {} SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
            entity.table()
        );

        let result = sqlx::query(&query)
            .bind(to)
            .bind(now)
            .bind(id)
            .bind(from)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update {} status: {}",
                    entity, e
                )))
            })?;

        Ok(result.rows_affected() == 1)
    }
}

fn insert_error(what: &str, e: sqlx::Error) -> Error {
    let is_duplicate = e
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if is_duplicate {
        Error::Database(DatabaseError::ConstraintViolation(format!(
            "{} already exists: {}",
            what, e
        )))
    } else {
        Error::Database(DatabaseError::QueryFailed(format!(
            "Failed to insert {}: {}",
            what, e
        )))
    }
}
