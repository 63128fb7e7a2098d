//! Gate Error Types
//!
//! Unified error handling for readiness gating and routing.
//!
//! Parsing of status rows never produces an error: missing or unrecognized
//! fields become absent values. Everything else surfaces here.

use thiserror::Error;

use crate::status::NotReplicatedError;
use crate::transport::TransportError;

/// Result type for gate operations
pub type GateResult<T> = Result<T, GateError>;

/// What the readiness gate saw on its final attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastObservation {
    /// The accelerator answered, but snapshotting had not completed
    NotSnapshotted {
        /// Raw `Snapshot Status` text, if reported
        snapshot_status: Option<String>,
    },
    /// The status query itself failed
    Unreachable(String),
}

impl std::fmt::Display for LastObservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSnapshotted {
                snapshot_status: Some(status),
            } => write!(f, "snapshot status is '{}'", status),
            Self::NotSnapshotted {
                snapshot_status: None,
            } => write!(f, "snapshot status not reported"),
            Self::Unreachable(reason) => write!(f, "accelerator unreachable ({})", reason),
        }
    }
}

/// Gate errors
#[derive(Debug, Clone, Error)]
pub enum GateError {
    #[error(
        "ReadySet database is not ready for service! {attempts} attempt(s) over {elapsed_ms}ms, last: {last}"
    )]
    NotReady {
        attempts: u32,
        elapsed_ms: u64,
        last: LastObservation,
    },

    #[error(transparent)]
    NotReplicated(#[from] NotReplicatedError),

    #[error("Table {name} is not known to ReadySet")]
    UnknownTable { name: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Table status refresh timed out after {timeout_ms}ms")]
    RefreshTimeout { timeout_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parameter binding error: {0}")]
    Bind(String),
}

impl GateError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parameter binding error
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    /// Create an unknown table error
    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::UnknownTable { name: name.into() }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotReady { .. } => "READYSET_NOT_READY",
            Self::NotReplicated(_) => "READYSET_TABLE_NOT_REPLICATED",
            Self::UnknownTable { .. } => "READYSET_UNKNOWN_TABLE",
            Self::Transport(_) => "READYSET_TRANSPORT",
            Self::RefreshTimeout { .. } => "READYSET_REFRESH_TIMEOUT",
            Self::Config(_) => "READYSET_CONFIG",
            Self::Bind(_) => "READYSET_BIND",
        }
    }

    /// True when the accelerator could not be talked to at all.
    ///
    /// Routing must propagate these rather than pick a destination.
    pub fn is_outage(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RefreshTimeout { .. })
    }

    /// True when the table set itself keeps the query off the accelerator
    pub fn is_table_unusable(&self) -> bool {
        matches!(self, Self::NotReplicated(_) | Self::UnknownTable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(GateError::unknown_table("t1").code(), "READYSET_UNKNOWN_TABLE");
        assert_eq!(GateError::config("bad").code(), "READYSET_CONFIG");
        assert_eq!(
            GateError::from(TransportError::connection("refused")).code(),
            "READYSET_TRANSPORT"
        );
    }

    #[test]
    fn test_not_ready_message_leads_with_service_text() {
        let err = GateError::NotReady {
            attempts: 3,
            elapsed_ms: 250,
            last: LastObservation::NotSnapshotted {
                snapshot_status: Some("In Progress".to_string()),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("ReadySet database is not ready for service!"));
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("In Progress"));
    }

    #[test]
    fn test_classification() {
        assert!(GateError::from(TransportError::timeout(10)).is_outage());
        assert!(GateError::RefreshTimeout { timeout_ms: 5 }.is_outage());
        assert!(!GateError::unknown_table("t").is_outage());

        let not_replicated = NotReplicatedError::new("t1", Some("unsupported type".to_string()));
        assert!(GateError::from(not_replicated).is_table_unusable());
        assert!(GateError::unknown_table("t").is_table_unusable());
        assert!(!GateError::config("x").is_table_unusable());
    }

    #[test]
    fn test_unreachable_observation_display() {
        let obs = LastObservation::Unreachable("connection refused".to_string());
        assert_eq!(obs.to_string(), "accelerator unreachable (connection refused)");
    }
}
