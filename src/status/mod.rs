//! Accelerator Status Surface
//!
//! Parsed, immutable views of what the accelerator reports about itself:
//! - [`StatusSnapshot`]: cluster-wide status from `SHOW READYSET STATUS`
//! - [`TableState`]: per-table replication status from `SHOW READYSET TABLES`
//!
//! Parsing is total. Unknown field names are ignored and missing ones become
//! absent values, so new or renamed status fields never break the client.

mod snapshot;
mod source;
mod table;

pub use snapshot::{
    StatusSnapshot, FIELD_CONNECTION_COUNT, FIELD_CONTROLLER_STATUS, FIELD_DATABASE_CONNECTION,
    FIELD_LAST_COMPLETED_SNAPSHOT, FIELD_LAST_REPLICATOR_ERROR, FIELD_LAST_STARTED_CONTROLLER,
    FIELD_LAST_STARTED_REPLICATION, FIELD_MAXIMUM_REPLICATION_OFFSET,
    FIELD_MINIMUM_REPLICATION_OFFSET, FIELD_SNAPSHOT_STATUS,
};
pub use source::{StatusSource, STATUS_STATEMENT, TABLES_STATEMENT};
pub use table::{NotReplicatedError, TableState, TableStatus};
