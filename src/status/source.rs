//! Status source
//!
//! Issues the two administrative statements and parses their rows. Transport
//! failures are returned as-is; retrying is the caller's business.

use crate::error::GateResult;
use crate::transport::Accelerator;

use super::snapshot::StatusSnapshot;
use super::table::TableState;

/// Cluster-wide status: `{name, value}` rows
pub const STATUS_STATEMENT: &str = "SHOW READYSET STATUS";

/// Per-table status: `{table, status, description}` rows
pub const TABLES_STATEMENT: &str = "SHOW READYSET TABLES";

/// Fetches and parses the accelerator's status surface
#[derive(Debug, Clone)]
pub struct StatusSource {
    accelerator: Accelerator,
}

impl StatusSource {
    /// Source reading through `accelerator`
    pub fn new(accelerator: Accelerator) -> Self {
        Self { accelerator }
    }

    /// The accelerator this source reads from
    pub fn accelerator(&self) -> &Accelerator {
        &self.accelerator
    }

    /// Run `SHOW READYSET STATUS` and parse the result
    pub async fn fetch_status(&self) -> GateResult<StatusSnapshot> {
        let rows = self.accelerator.raw_query(STATUS_STATEMENT).await?;
        Ok(StatusSnapshot::from_rows(&rows))
    }

    /// Run `SHOW READYSET TABLES` and parse every row that names a table
    pub async fn fetch_tables(&self) -> GateResult<Vec<TableState>> {
        let rows = self.accelerator.raw_query(TABLES_STATEMENT).await?;
        Ok(rows.iter().filter_map(TableState::from_row).collect())
    }
}
