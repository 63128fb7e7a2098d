//! Per-table replication state

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::transport::Row;

/// A table's replication status, normalized to lower snake case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Permanently excluded from the accelerator until re-snapshotted externally
    NotReplicated,
    /// Initial copy in progress
    Snapshotting,
    /// Fully replicated, safe to serve
    Snapshotted,
    /// Any other reported status, normalized
    Other(String),
}

impl TableStatus {
    /// Normalize raw status text: lower-case, spaces to underscores
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(' ', "_");
        match normalized.as_str() {
            "not_replicated" => TableStatus::NotReplicated,
            "snapshotting" => TableStatus::Snapshotting,
            "snapshotted" => TableStatus::Snapshotted,
            _ => TableStatus::Other(normalized),
        }
    }

    /// Normalized status text
    pub fn as_str(&self) -> &str {
        match self {
            TableStatus::NotReplicated => "not_replicated",
            TableStatus::Snapshotting => "snapshotting",
            TableStatus::Snapshotted => "snapshotted",
            TableStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a table is expected to be replicated but isn't
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Table {name} is not replicated: {}", .description.as_deref().unwrap_or("no description"))]
pub struct NotReplicatedError {
    pub name: String,
    pub description: Option<String>,
}

impl NotReplicatedError {
    /// Error for table `name` with an optional reason
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

/// One table as known by the accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableState {
    name: String,
    status: TableStatus,
    description: Option<String>,
}

impl TableState {
    /// Table state from already-parsed parts
    pub fn new(name: impl Into<String>, status: TableStatus, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            status,
            description,
        }
    }

    /// Parse one row of `SHOW READYSET TABLES`.
    ///
    /// Returns `None` for rows without a table name. A missing status
    /// normalizes to `Other("unknown")`.
    pub fn from_row(row: &Row) -> Option<Self> {
        let name = row.get("table")?.as_deref()?;
        let status = row
            .get("status")
            .and_then(|s| s.as_deref())
            .map(TableStatus::from_raw)
            .unwrap_or_else(|| TableStatus::Other("unknown".to_string()));
        let description = row.get("description").cloned().flatten();
        Some(Self::new(name, status, description))
    }

    /// Fully qualified table name as reported
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized replication status
    pub fn status(&self) -> &TableStatus {
        &self.status
    }

    /// Reason reported for a non-replicated table, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the table has finished snapshotting.
    ///
    /// `Ok(false)` means "not yet"; a not-replicated table will never be
    /// ready and is reported as an error instead.
    pub fn snapshotting_completed(&self) -> Result<bool, NotReplicatedError> {
        match self.status {
            TableStatus::NotReplicated => Err(NotReplicatedError::new(
                self.name.clone(),
                self.description.clone(),
            )),
            TableStatus::Snapshotted => Ok(true),
            _ => Ok(false),
        }
    }
}
