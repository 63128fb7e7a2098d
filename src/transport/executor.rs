//! Execution capability seam

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::errors::TransportResult;

/// One result row: column name to text value, `None` for SQL NULL
pub type Row = HashMap<String, Option<String>>;

/// Future returned by [`QueryExecutor::execute`]
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = TransportResult<Vec<Row>>> + Send + 'a>>;

/// Executes a literal SQL statement against one database
pub trait QueryExecutor: Send + Sync {
    /// Run `sql` and return every row it produced
    fn execute<'a>(&'a self, sql: &'a str) -> ExecuteFuture<'a>;
}
