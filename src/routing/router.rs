//! Routing decisions
//!
//! A query goes to the accelerator only if every table it references is
//! snapshotted. One table that isn't (unknown, not replicated, still
//! snapshotting, or in any other state) sends the whole query to the
//! primary: a uniformly-primary answer beats a partially replicated join.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{GateError, GateResult};
use crate::observability::{log_event, Event};
use crate::status::{TableState, TableStatus};

use super::cache::TableStateCache;

const LOGGED_QUERY_CHARS: usize = 120;

/// Where a query should be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Accelerator,
    Primary,
}

impl Destination {
    /// Lower-case name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Accelerator => "accelerator",
            Destination::Primary => "primary",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a destination was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteReason {
    /// The query references no tables
    NoTables,
    /// Every referenced table is snapshotted
    AllSnapshotted,
    /// A referenced table is not known to the accelerator
    UnknownTable(String),
    /// A referenced table is permanently excluded from the accelerator
    NotReplicated(String),
    /// A referenced table is known but not yet snapshotted
    NotSnapshotted { table: String, status: TableStatus },
}

impl fmt::Display for RouteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteReason::NoTables => write!(f, "no tables referenced"),
            RouteReason::AllSnapshotted => write!(f, "all tables snapshotted"),
            RouteReason::UnknownTable(t) => write!(f, "table {} unknown to accelerator", t),
            RouteReason::NotReplicated(t) => write!(f, "table {} not replicated", t),
            RouteReason::NotSnapshotted { table, status } => {
                write!(f, "table {} is {}", table, status)
            }
        }
    }
}

/// A destination together with its justification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub destination: Destination,
    pub reason: RouteReason,
}

impl RoutingDecision {
    fn primary(reason: RouteReason) -> Self {
        Self {
            destination: Destination::Primary,
            reason,
        }
    }
}

/// Decides, per query, between the accelerator and the primary
#[derive(Debug, Clone)]
pub struct QueryRouter {
    cache: Arc<TableStateCache>,
}

impl QueryRouter {
    /// Router answering from `cache`
    pub fn new(cache: Arc<TableStateCache>) -> Self {
        Self { cache }
    }

    /// The table state cache this router consults
    pub fn cache(&self) -> &Arc<TableStateCache> {
        &self.cache
    }

    /// Destination for `query`, which references `tables`.
    ///
    /// Unusable tables degrade to `Primary`; transport failures propagate.
    pub async fn route(&self, query: &str, tables: &BTreeSet<String>) -> GateResult<Destination> {
        Ok(self.decide(query, tables).await?.destination)
    }

    /// Like [`route`](Self::route), but also says why
    pub async fn decide(&self, query: &str, tables: &BTreeSet<String>) -> GateResult<RoutingDecision> {
        let decision = if tables.is_empty() {
            RoutingDecision::primary(RouteReason::NoTables)
        } else {
            match self.cache.get(tables).await {
                Ok(states) => evaluate(tables, &states),
                Err(GateError::UnknownTable { name }) => {
                    RoutingDecision::primary(RouteReason::UnknownTable(name))
                }
                Err(err) => return Err(err),
            }
        };

        let logged_query: String = query.chars().take(LOGGED_QUERY_CHARS).collect();
        let reason = decision.reason.to_string();
        log_event(
            Event::RouteDecided,
            &[
                ("destination", decision.destination.as_str()),
                ("query", logged_query.as_str()),
                ("reason", reason.as_str()),
            ],
        );
        Ok(decision)
    }

    /// Strict readiness check for an explicit "is this ready" question.
    ///
    /// `Ok(true)` when every table is snapshotted, `Ok(false)` while any is
    /// still in progress. Not-replicated and unknown tables are errors, since
    /// they will not become ready by waiting. An empty set is ready.
    pub async fn is_ready(&self, tables: &BTreeSet<String>) -> GateResult<bool> {
        if tables.is_empty() {
            return Ok(true);
        }
        let states = self.cache.get(tables).await?;

        let mut ready = true;
        for name in tables {
            if let Some(state) = states.get(name) {
                ready &= state.snapshotting_completed()?;
            }
        }
        Ok(ready)
    }
}

/// Pick a destination from one consistent set of table states.
///
/// A not-replicated table is reported in preference to an in-progress one.
fn evaluate(tables: &BTreeSet<String>, states: &HashMap<String, TableState>) -> RoutingDecision {
    let mut pending: Option<RouteReason> = None;

    for name in tables {
        let Some(state) = states.get(name) else {
            return RoutingDecision::primary(RouteReason::UnknownTable(name.clone()));
        };
        match state.status() {
            TableStatus::Snapshotted => {}
            TableStatus::NotReplicated => {
                return RoutingDecision::primary(RouteReason::NotReplicated(name.clone()));
            }
            other => {
                pending.get_or_insert_with(|| RouteReason::NotSnapshotted {
                    table: name.clone(),
                    status: other.clone(),
                });
            }
        }
    }

    match pending {
        Some(reason) => RoutingDecision::primary(reason),
        None => RoutingDecision {
            destination: Destination::Accelerator,
            reason: RouteReason::AllSnapshotted,
        },
    }
}
