//! Cluster-wide status snapshot
//!
//! Built from the `{name, value}` rows of `SHOW READYSET STATUS`. A snapshot
//! never changes after construction; fetching again produces a new one.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::GateResult;
use crate::observability::{Event, Logger};
use crate::transport::Row;

use super::source::StatusSource;

pub const FIELD_CONNECTION_COUNT: &str = "Connection Count";
pub const FIELD_DATABASE_CONNECTION: &str = "Database Connection";
pub const FIELD_LAST_COMPLETED_SNAPSHOT: &str = "Last completed snapshot";
pub const FIELD_LAST_REPLICATOR_ERROR: &str = "Last replicator error";
pub const FIELD_LAST_STARTED_CONTROLLER: &str = "Last started Controller";
pub const FIELD_LAST_STARTED_REPLICATION: &str = "Last started replication";
pub const FIELD_MINIMUM_REPLICATION_OFFSET: &str = "Minimum Replication Offset";
pub const FIELD_MAXIMUM_REPLICATION_OFFSET: &str = "Maximum Replication Offset";
pub const FIELD_CONTROLLER_STATUS: &str = "ReadySet Controller Status";
pub const FIELD_SNAPSHOT_STATUS: &str = "Snapshot Status";

const DATABASE_CONNECTED: &str = "Connected";
const SNAPSHOT_COMPLETED: &str = "Completed";

/// Immutable view of the accelerator's status at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    connection_count: i64,
    connected_to_database: bool,
    controller_status: Option<String>,
    last_completed_snapshot: Option<DateTime<Utc>>,
    last_replicator_error: Option<String>,
    last_started_controller: Option<DateTime<Utc>>,
    last_started_replication: Option<DateTime<Utc>>,
    minimum_replication_offset: Option<String>,
    maximum_replication_offset: Option<String>,
    snapshot_status: Option<String>,
    snapshotting_completed: bool,
}

impl StatusSnapshot {
    /// Parse the rows returned by `SHOW READYSET STATUS`.
    ///
    /// Rows without a `name` column are skipped. When a name repeats, the
    /// last row wins.
    pub fn from_rows(rows: &[Row]) -> Self {
        Self::from_pairs(rows.iter().filter_map(|row| {
            let name = row.get("name")?.as_deref()?;
            let value = row.get("value").and_then(|v| v.as_deref());
            Some((name, value))
        }))
    }

    /// Parse `(name, value)` pairs directly
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let attributes: HashMap<&str, Option<&str>> = pairs.into_iter().collect();
        let text = |name: &str| attributes.get(name).copied().flatten();
        let owned = |name: &str| text(name).map(str::to_string);

        Self {
            connection_count: text(FIELD_CONNECTION_COUNT).map(leading_integer).unwrap_or(0),
            connected_to_database: text(FIELD_DATABASE_CONNECTION) == Some(DATABASE_CONNECTED),
            controller_status: owned(FIELD_CONTROLLER_STATUS),
            last_completed_snapshot: parse_timestamp(FIELD_LAST_COMPLETED_SNAPSHOT, text(FIELD_LAST_COMPLETED_SNAPSHOT)),
            last_replicator_error: owned(FIELD_LAST_REPLICATOR_ERROR),
            last_started_controller: parse_timestamp(FIELD_LAST_STARTED_CONTROLLER, text(FIELD_LAST_STARTED_CONTROLLER)),
            last_started_replication: parse_timestamp(FIELD_LAST_STARTED_REPLICATION, text(FIELD_LAST_STARTED_REPLICATION)),
            minimum_replication_offset: owned(FIELD_MINIMUM_REPLICATION_OFFSET),
            maximum_replication_offset: owned(FIELD_MAXIMUM_REPLICATION_OFFSET),
            snapshot_status: owned(FIELD_SNAPSHOT_STATUS),
            snapshotting_completed: text(FIELD_SNAPSHOT_STATUS) == Some(SNAPSHOT_COMPLETED),
        }
    }

    /// Fetch a fresh snapshot. `self` is left untouched.
    pub async fn reload(&self, source: &StatusSource) -> GateResult<StatusSnapshot> {
        source.fetch_status().await
    }

    /// Client connections reported by the accelerator, 0 if absent or unparseable
    pub fn connection_count(&self) -> i64 {
        self.connection_count
    }

    /// True if the accelerator holds a live connection to the primary database
    pub fn connected_to_database(&self) -> bool {
        self.connected_to_database
    }

    /// Raw `ReadySet Controller Status` text
    pub fn controller_status(&self) -> Option<&str> {
        self.controller_status.as_deref()
    }

    /// When the last snapshot completed
    pub fn last_completed_snapshot(&self) -> Option<DateTime<Utc>> {
        self.last_completed_snapshot
    }

    /// Most recent replicator error message
    pub fn last_replicator_error(&self) -> Option<&str> {
        self.last_replicator_error.as_deref()
    }

    /// When the controller last started
    pub fn last_started_controller(&self) -> Option<DateTime<Utc>> {
        self.last_started_controller
    }

    /// When replication last started
    pub fn last_started_replication(&self) -> Option<DateTime<Utc>> {
        self.last_started_replication
    }

    /// Opaque replication log position; not interpreted here
    pub fn minimum_replication_offset(&self) -> Option<&str> {
        self.minimum_replication_offset.as_deref()
    }

    /// Opaque replication log position; not interpreted here
    pub fn maximum_replication_offset(&self) -> Option<&str> {
        self.maximum_replication_offset.as_deref()
    }

    /// Raw `Snapshot Status` text as reported
    pub fn snapshot_status(&self) -> Option<&str> {
        self.snapshot_status.as_deref()
    }

    /// True once the accelerator has snapshotted every table it tracks
    pub fn snapshotting_completed(&self) -> bool {
        self.snapshotting_completed
    }
}

/// Leading-integer parse: optional sign then digits, anything else reads as 0
fn leading_integer(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Parse a status timestamp.
///
/// Accepts RFC 3339 and `YYYY-MM-DD HH:MM:SS[.fff]` (read as UTC). Text that
/// fits neither is logged and treated as absent.
fn parse_timestamp(field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    Logger::warn(
        Event::StatusFieldUnparsed.as_str(),
        &[("field", field), ("value", raw)],
    );
    None
}
