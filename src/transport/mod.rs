//! Transport Boundary
//!
//! The only way this crate talks to the accelerator is by handing a literal
//! SQL statement to a [`QueryExecutor`] and reading back rows of
//! `column -> Option<String>`. The executor itself (wire protocol, pooling)
//! lives outside the crate.
//!
//! [`Accelerator`] wraps an executor and is the raw escape hatch used by the
//! status source and by operational tooling that needs unmediated access.

mod accelerator;
mod errors;
mod executor;
mod memory;

pub use accelerator::{bind_params, Accelerator, SqlValue};
pub use errors::{TransportError, TransportResult};
pub use executor::{ExecuteFuture, QueryExecutor, Row};
pub use memory::{status_rows, table_row, MemoryExecutor};
