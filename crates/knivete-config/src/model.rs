use std::path::PathBuf;
use std::time::Duration;

use knivete_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration. Every field may be omitted from the file; CLI
/// flags fill in or override `server` and `directory`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: Option<String>,
    pub directory: Option<PathBuf>,
    pub http: HttpConfig,
    pub readiness: ReadinessConfig,
    pub bookkeeping: BookkeepingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Write every request and raw response body to an audit file.
    pub audit_log: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            audit_log: true,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How long to wait for a freshly created object to become queryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            timeout_secs: 60,
        }
    }
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Names and topic layout of the record table and its aggregation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookkeepingConfig {
    pub table: String,
    pub view: String,
    pub topic: String,
    pub partitions: u32,
    pub replicas: u32,
}

impl Default for BookkeepingConfig {
    fn default() -> Self {
        Self {
            table: "applied_migrations".to_string(),
            view: "applied_migrations_agg".to_string(),
            topic: "applied-migrations".to_string(),
            partitions: 1,
            replicas: 1,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(server) = &self.server
            && !(server.starts_with("http://") || server.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "server must be an http(s) URL, got '{server}'"
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be positive".into()));
        }
        if self.readiness.poll_interval_ms == 0 {
            return Err(Error::Config(
                "readiness.poll_interval_ms must be positive".into(),
            ));
        }
        if self.readiness.timeout_secs == 0 {
            return Err(Error::Config(
                "readiness.timeout_secs must be positive".into(),
            ));
        }

        let b = &self.bookkeeping;
        for (field, value) in [("table", &b.table), ("view", &b.view), ("topic", &b.topic)] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "bookkeeping.{field} cannot be empty"
                )));
            }
        }
        if b.table.eq_ignore_ascii_case(&b.view) {
            return Err(Error::Config(
                "bookkeeping.table and bookkeeping.view must differ".into(),
            ));
        }
        if b.partitions == 0 || b.replicas == 0 {
            return Err(Error::Config(
                "bookkeeping.partitions and bookkeeping.replicas must be positive".into(),
            ));
        }
        Ok(())
    }
}
