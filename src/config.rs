//! Configuration types for loadtest-report

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Worker pool sizing and join behavior
///
/// Both pools are owned by the [`ReportOrchestrator`](crate::ReportOrchestrator)
/// instance built from this config, so tests can run with small pools.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum finalize jobs running at once (default: 10)
    #[serde(default = "default_finalize_pool_size")]
    pub finalize_pool_size: usize,

    /// Maximum generator tasks running at once, across all runs (default: 30)
    #[serde(default = "default_generator_pool_size")]
    pub generator_pool_size: usize,

    /// Deadline for the join on generator tasks, in seconds (None = wait forever)
    ///
    /// When the deadline elapses the cycle fails with
    /// [`Error::GenerationTimeout`] and the run stays in `Reporting`.
    #[serde(default, with = "optional_duration_serde")]
    pub join_timeout: Option<Duration>,

    /// How long shutdown waits for in-flight finalize jobs, in seconds (default: 30)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            finalize_pool_size: default_finalize_pool_size(),
            generator_pool_size: default_generator_pool_size(),
            join_timeout: None,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Metric ingestion settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Substring of a metric's thread name that marks test teardown (default: "tearDown")
    #[serde(default = "default_teardown_marker")]
    pub teardown_marker: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            teardown_marker: default_teardown_marker(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./loadtest-report.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration for [`ReportOrchestrator`](crate::ReportOrchestrator)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Worker pools and join deadline
    #[serde(default)]
    pub pools: PoolConfig,

    /// Metric ingestion
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Database location
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Check that the configuration can build a working orchestrator
    pub fn validate(&self) -> Result<()> {
        if self.pools.finalize_pool_size == 0 {
            return Err(Error::Config {
                message: "finalize pool needs at least one slot".to_string(),
                key: Some("pools.finalize_pool_size".to_string()),
            });
        }
        if self.pools.generator_pool_size == 0 {
            return Err(Error::Config {
                message: "generator pool needs at least one slot".to_string(),
                key: Some("pools.generator_pool_size".to_string()),
            });
        }
        if self.ingest.teardown_marker.is_empty() {
            return Err(Error::Config {
                message: "teardown marker must not be empty".to_string(),
                key: Some("ingest.teardown_marker".to_string()),
            });
        }
        Ok(())
    }
}

fn default_finalize_pool_size() -> usize {
    10
}

fn default_generator_pool_size() -> usize {
    30
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_teardown_marker() -> String {
    "tearDown".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./loadtest-report.db")
}

// Duration serialization helper (as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
