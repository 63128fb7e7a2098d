//! Scripted in-memory executor
//!
//! Stands in for a live accelerator in tests and local tooling. Responses
//! are scripted per statement: queued responses are consumed in order, after
//! which the sticky response (if any) is replayed forever.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::errors::{TransportError, TransportResult};
use super::executor::{ExecuteFuture, QueryExecutor, Row};

#[derive(Default)]
struct Script {
    queued: VecDeque<TransportResult<Vec<Row>>>,
    sticky: Option<TransportResult<Vec<Row>>>,
    calls: usize,
}

/// Executor that replays scripted rows or errors
#[derive(Default)]
pub struct MemoryExecutor {
    scripts: Mutex<HashMap<String, Script>>,
    latency: Duration,
}

impl MemoryExecutor {
    /// Create an executor with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer `sql` with `rows` whenever nothing is queued
    pub fn respond(&self, sql: &str, rows: Vec<Row>) {
        self.set_sticky(sql, Ok(rows));
    }

    /// Fail `sql` with `error` whenever nothing is queued
    pub fn fail(&self, sql: &str, error: TransportError) {
        self.set_sticky(sql, Err(error));
    }

    /// Queue a one-shot response for `sql`
    pub fn enqueue(&self, sql: &str, result: TransportResult<Vec<Row>>) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(sql.to_string()).or_default().queued.push_back(result);
        }
    }

    /// Number of times `sql` has been executed
    pub fn calls(&self, sql: &str) -> usize {
        self.scripts
            .lock()
            .ok()
            .and_then(|scripts| scripts.get(sql).map(|s| s.calls))
            .unwrap_or(0)
    }

    fn set_sticky(&self, sql: &str, result: TransportResult<Vec<Row>>) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(sql.to_string()).or_default().sticky = Some(result);
        }
    }

    fn next_response(&self, sql: &str) -> TransportResult<Vec<Row>> {
        let mut scripts = self
            .scripts
            .lock()
            .map_err(|_| TransportError::database("memory executor lock poisoned"))?;
        let script = scripts.entry(sql.to_string()).or_default();
        script.calls += 1;

        if let Some(result) = script.queued.pop_front() {
            return result;
        }
        script
            .sticky
            .clone()
            .unwrap_or_else(|| Err(TransportError::database(format!("no response scripted for '{}'", sql))))
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute<'a>(&'a self, sql: &'a str) -> ExecuteFuture<'a> {
        Box::pin(async move {
            let result = self.next_response(sql);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            result
        })
    }
}

/// Build `{name, value}` rows as returned by `SHOW READYSET STATUS`
pub fn status_rows(pairs: &[(&str, Option<&str>)]) -> Vec<Row> {
    pairs
        .iter()
        .map(|(name, value)| {
            let mut row = Row::new();
            row.insert("name".to_string(), Some(name.to_string()));
            row.insert("value".to_string(), value.map(str::to_string));
            row
        })
        .collect()
}

/// Build one `{table, status, description}` row as returned by `SHOW READYSET TABLES`
pub fn table_row(table: &str, status: &str, description: Option<&str>) -> Row {
    let mut row = Row::new();
    row.insert("table".to_string(), Some(table.to_string()));
    row.insert("status".to_string(), Some(status.to_string()));
    row.insert("description".to_string(), description.map(str::to_string));
    row
}
