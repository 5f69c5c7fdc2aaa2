//! Error types for loadtest-report
//!
//! This module provides the error taxonomy for the library:
//! - Domain-specific error types (database, report generation)
//! - Cycle-level failures of the finalize job (interrupted join, join deadline, lost claim)
//! - Context information (report id, generator name, entity kind) on every variant

use crate::types::{EntityKind, RunStatus};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for loadtest-report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for loadtest-report
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "pools.finalize_pool_size")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// A single report generator failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// The finalize job's wait on the join barrier was interrupted.
    ///
    /// The run is left in `Reporting`; nothing retries it.
    #[error("join on report {report_id} interrupted: {reason}")]
    SynchronizationInterrupted {
        /// Report whose generation cycle was abandoned
        report_id: String,
        /// What interrupted the wait
        reason: String,
    },

    /// The configured join deadline elapsed before every generator counted down
    #[error("report {report_id} generation timed out after {timeout:?} with {pending} generator(s) pending")]
    GenerationTimeout {
        /// Report whose generation cycle was abandoned
        report_id: String,
        /// The deadline that elapsed
        timeout: Duration,
        /// Number of generator tasks that had not counted down
        pending: usize,
    },

    /// A compare-and-set status transition did not apply
    #[error("{entity} {id}: expected status {expected} before moving to {target}, found {}", display_status(.actual))]
    TransitionConflict {
        /// Which entity was being advanced
        entity: EntityKind,
        /// Entity primary key
        id: String,
        /// Status the transition required
        expected: RunStatus,
        /// Status the transition would have applied
        target: RunStatus,
        /// Status found instead (None if the entity does not exist)
        actual: Option<RunStatus>,
    },

    /// Requested a transition that is not an edge of the run lifecycle
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Expected prior status
        from: RunStatus,
        /// Requested status
        to: RunStatus,
    },

    /// A stored status string that is not part of the lifecycle
    #[error("invalid run status: {0}")]
    InvalidStatus(String),

    /// Shutdown in progress - not accepting new completion signals
    #[error("shutdown in progress: not accepting new report generation")]
    ShuttingDown,
}

fn display_status(status: &Option<RunStatus>) -> &'static str {
    status.map_or("no record", |s| s.as_str())
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Failure of one report generator variant
///
/// These never abort sibling generators or the join; the orchestrator logs them,
/// broadcasts them, and records them in the cycle summary.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The generator ran and reported a failure
    #[error("generator {generator} failed: {reason}")]
    Failed {
        /// Generator name
        generator: String,
        /// Why it failed
        reason: String,
    },

    /// The assembled content could not be parsed by the generator
    #[error("generator {generator} rejected line {line}: {reason}")]
    InvalidContent {
        /// Generator name
        generator: String,
        /// 1-based line number within the assembled content
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// The generator task panicked
    #[error("generator {generator} panicked: {message}")]
    Panicked {
        /// Generator name
        generator: String,
        /// Panic payload, if it was a string
        message: String,
    },

    /// No pool slot could be acquired for the generator task
    #[error("generator {generator} could not be scheduled: worker pool closed")]
    PoolClosed {
        /// Generator name
        generator: String,
    },

    /// The generator succeeded but its output could not be stored
    #[error("generator {generator} output could not be saved: {reason}")]
    Persist {
        /// Generator name
        generator: String,
        /// Underlying storage error
        reason: String,
    },
}

impl GenerationError {
    /// Convenience constructor for [`GenerationError::Failed`]
    pub fn failed(generator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            generator: generator.into(),
            reason: reason.into(),
        }
    }

    /// Name of the generator this error belongs to
    pub fn generator(&self) -> &str {
        match self {
            Self::Failed { generator, .. }
            | Self::InvalidContent { generator, .. }
            | Self::Panicked { generator, .. }
            | Self::PoolClosed { generator }
            | Self::Persist { generator, .. } => generator,
        }
    }
}
