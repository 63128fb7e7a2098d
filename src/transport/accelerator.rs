//! Raw access to the accelerator
//!
//! Statements with parameters are sanitized before they reach the executor:
//! every `?` placeholder outside a quoted literal is replaced with a properly
//! quoted SQL literal.

use std::fmt;
use std::sync::Arc;

use crate::error::{GateError, GateResult};
use crate::observability::{Event, Logger};

use super::errors::TransportResult;
use super::executor::{QueryExecutor, Row};

/// A value bound into a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SqlValue {
    /// Render as a SQL literal
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Text(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('\'');
                for c in s.chars() {
                    if c == '\'' {
                        out.push('\'');
                    }
                    out.push(c);
                }
                out.push('\'');
                out
            }
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Substitute `params` into the `?` placeholders of `template`.
///
/// Placeholders inside single- or double-quoted sections are left alone.
/// The number of placeholders must match the number of parameters.
pub fn bind_params(template: &str, params: &[SqlValue]) -> GateResult<String> {
    let mut out = String::with_capacity(template.len() + params.len() * 8);
    let mut remaining = params.iter();
    let mut used = 0usize;
    let mut quote: Option<char> = None;

    for c in template.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            (Some(_), c) => out.push(c),
            (None, '\'') | (None, '"') => {
                quote = Some(c);
                out.push(c);
            }
            (None, '?') => {
                let value = remaining.next().ok_or_else(|| {
                    GateError::bind(format!(
                        "statement has more placeholders than the {} parameter(s) supplied",
                        params.len()
                    ))
                })?;
                out.push_str(&value.to_literal());
                used += 1;
            }
            (None, c) => out.push(c),
        }
    }

    if used != params.len() {
        return Err(GateError::bind(format!(
            "statement has {} placeholder(s) but {} parameter(s) were supplied",
            used,
            params.len()
        )));
    }

    Ok(out)
}

/// Handle to the accelerator's execution capability
#[derive(Clone)]
pub struct Accelerator {
    executor: Arc<dyn QueryExecutor>,
}

impl Accelerator {
    /// Wrap an executor connected to the accelerator
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Run this exact statement against the accelerator
    pub async fn raw_query(&self, sql: &str) -> TransportResult<Vec<Row>> {
        Logger::trace(Event::RawQuery.as_str(), &[("sql", sql)]);
        self.executor.execute(sql).await
    }

    /// Bind `params` into `sql` and run the result against the accelerator
    pub async fn raw_query_with(&self, sql: &str, params: &[SqlValue]) -> GateResult<Vec<Row>> {
        let statement = bind_params(sql, params)?;
        Ok(self.raw_query(&statement).await?)
    }
}

impl fmt::Debug for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accelerator").finish_non_exhaustive()
    }
}
