//! Core types for loadtest-report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Implements the string newtype plumbing shared by [`RunId`] and [`TestId`]:
/// conversions, `Display`, and sqlx TEXT encoding.
macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Create a new identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <String as sqlx::Type<sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                Ok(Self(id))
            }
        }
    };
}

/// Identifier of one run (the report record that owns the run's content)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

/// Identifier of the load test a run belongs to
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(pub String);

string_id!(RunId);
string_id!(TestId);

/// Run status shared by the test and report entities
///
/// The stored representation is the variant name (`"Starting"`, `"Running"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Created, no metrics received yet
    Starting,
    /// Metrics are being ingested
    Running,
    /// Teardown received, generators are running
    Reporting,
    /// Every generator has finished
    Completed,
}

impl RunStatus {
    /// Stored string value of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Starting => "Starting",
            RunStatus::Running => "Running",
            RunStatus::Reporting => "Reporting",
            RunStatus::Completed => "Completed",
        }
    }

    /// The status that follows this one in the lifecycle, if any
    pub fn next(&self) -> Option<RunStatus> {
        match self {
            RunStatus::Starting => Some(RunStatus::Running),
            RunStatus::Running => Some(RunStatus::Reporting),
            RunStatus::Reporting => Some(RunStatus::Completed),
            RunStatus::Completed => None,
        }
    }

    /// Whether `self -> to` is an edge of the lifecycle
    pub fn can_transition_to(&self, to: RunStatus) -> bool {
        self.next() == Some(to)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Starting" => Ok(RunStatus::Starting),
            "Running" => Ok(RunStatus::Running),
            "Reporting" => Ok(RunStatus::Reporting),
            "Completed" => Ok(RunStatus::Completed),
            other => Err(crate::Error::InvalidStatus(other.to_string())),
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for RunStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <&str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for RunStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for RunStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

/// The two entities that carry a [`RunStatus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The load test definition
    Test,
    /// The report produced for one run of the test
    Report,
}

impl EntityKind {
    /// Table holding this entity
    pub(crate) fn table(&self) -> &'static str {
        match self {
            EntityKind::Test => "load_tests",
            EntityKind::Report => "load_test_reports",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Test => f.write_str("test"),
            EntityKind::Report => f.write_str("report"),
        }
    }
}

/// One sampled event from a running load test
///
/// Deserializes from the camelCase JSON emitted by the load generator, with
/// timestamps as epoch milliseconds. Every field except the two identifiers may
/// be absent; absent fields encode as empty columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Sample start time
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Sample end time
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub elapsed_time: Option<DateTime<Utc>>,
    /// Sampler label
    #[serde(default)]
    pub sample_label: Option<String>,
    /// Response code (HTTP status or sampler-specific)
    #[serde(default)]
    pub response_code: Option<String>,
    /// Name of the thread that produced the sample
    #[serde(default)]
    pub thread_name: Option<String>,
    /// Data type tag ("text", "bin", ...)
    #[serde(default)]
    pub data_type: Option<String>,
    /// Whether the sample succeeded
    #[serde(default)]
    pub success: Option<bool>,
    /// Failure message, may contain newlines and commas
    #[serde(default)]
    pub failure_message: Option<String>,
    /// Received bytes
    #[serde(default)]
    pub bytes: Option<i64>,
    /// Sent bytes
    #[serde(default)]
    pub sent_bytes: Option<i64>,
    /// Active threads in this thread group
    #[serde(default)]
    pub grp_threads: Option<i64>,
    /// Active threads across all groups
    #[serde(default)]
    pub all_threads: Option<i64>,
    /// Target URL
    #[serde(default)]
    pub url: Option<String>,
    /// Latency in milliseconds
    #[serde(default)]
    pub latency: Option<i64>,
    /// Idle time in milliseconds
    #[serde(default)]
    pub idle_time: Option<i64>,
    /// Connect time in milliseconds
    #[serde(default)]
    pub connect_time: Option<i64>,
    /// Owning run
    pub report_id: RunId,
    /// Owning test
    pub test_id: TestId,
    /// Human-readable test name
    #[serde(default)]
    pub test_name: Option<String>,
}

impl MetricRecord {
    /// Create an empty record for a run; every optional field is `None`
    pub fn new(report_id: impl Into<RunId>, test_id: impl Into<TestId>) -> Self {
        Self {
            timestamp: None,
            elapsed_time: None,
            sample_label: None,
            response_code: None,
            thread_name: None,
            data_type: None,
            success: None,
            failure_message: None,
            bytes: None,
            sent_bytes: None,
            grp_threads: None,
            all_threads: None,
            url: None,
            latency: None,
            idle_time: None,
            connect_time: None,
            report_id: report_id.into(),
            test_id: test_id.into(),
            test_name: None,
        }
    }

    /// Whether this record marks test teardown (its thread name contains `marker`)
    pub fn is_teardown(&self, marker: &str) -> bool {
        self.thread_name
            .as_deref()
            .is_some_and(|name| name.contains(marker))
    }
}

/// Event emitted during a run's report lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A content part was stored
    PartAppended {
        /// Run the part belongs to
        report_id: RunId,
        /// Assigned sequence number (1-based)
        part: i64,
    },

    /// Teardown received and the run moved to `Reporting`
    Reporting {
        /// Run being reported
        report_id: RunId,
        /// Test the run belongs to
        test_id: TestId,
    },

    /// One generator finished successfully
    GeneratorCompleted {
        /// Run being reported
        report_id: RunId,
        /// Generator name
        generator: String,
    },

    /// One generator failed; siblings keep running
    GeneratorFailed {
        /// Run being reported
        report_id: RunId,
        /// Generator name
        generator: String,
        /// Error message
        error: String,
    },

    /// All generators finished and the run moved to `Completed`
    Completed {
        /// Run that completed
        report_id: RunId,
        /// Test the run belongs to
        test_id: TestId,
    },

    /// The finalize job gave up on the run before completing it
    GenerationAbandoned {
        /// Run that was abandoned
        report_id: RunId,
        /// Error message
        reason: String,
    },

    /// A compare-and-set transition did not apply
    TransitionConflict {
        /// Entity that was not advanced
        entity: EntityKind,
        /// Entity primary key
        id: String,
        /// Required prior status
        expected: RunStatus,
        /// Status that was not applied
        target: RunStatus,
    },
}
