//! ReadySet client facade
//!
//! Wires one accelerator executor into the status source, readiness gate,
//! table cache and router. There is no global instance: the application
//! builds one at start-up and shares it, tests build their own.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::observability::set_min_severity;
use crate::readiness::{ReadinessConfig, ReadinessGate};
use crate::routing::{CacheConfig, Destination, QueryRouter, RoutingDecision, TableStateCache};
use crate::status::{StatusSnapshot, StatusSource, TableState};
use crate::transport::{Accelerator, QueryExecutor, Row, SqlValue};

/// Entry point for application code
#[derive(Debug, Clone)]
pub struct ReadySetClient {
    config: Option<GateConfig>,
    source: StatusSource,
    gate: ReadinessGate,
    router: QueryRouter,
}

impl ReadySetClient {
    /// Build from validated configuration.
    ///
    /// Also applies the configured log level process-wide.
    pub fn from_config(config: GateConfig, executor: Arc<dyn QueryExecutor>) -> GateResult<Self> {
        config.validate()?;
        set_min_severity(config.log_level);

        let mut client = Self::new(executor, config.readiness_config(), config.cache_config());
        client.config = Some(config);
        Ok(client)
    }

    /// Build from explicit component settings
    pub fn new(executor: Arc<dyn QueryExecutor>, readiness: ReadinessConfig, cache: CacheConfig) -> Self {
        let source = StatusSource::new(Accelerator::new(executor));
        let cache = Arc::new(TableStateCache::new(source.clone(), cache));
        Self {
            config: None,
            gate: ReadinessGate::new(source.clone(), readiness),
            router: QueryRouter::new(cache),
            source,
        }
    }

    /// Block until the accelerator has finished snapshotting
    pub async fn establish(&self) -> GateResult<StatusSnapshot> {
        self.gate.establish().await
    }

    /// Where `query`, referencing `tables`, should run
    pub async fn route(&self, query: &str, tables: &BTreeSet<String>) -> GateResult<Destination> {
        self.router.route(query, tables).await
    }

    /// Routing decision with its reason
    pub async fn decide(&self, query: &str, tables: &BTreeSet<String>) -> GateResult<RoutingDecision> {
        self.router.decide(query, tables).await
    }

    /// Strict readiness check; see [`QueryRouter::is_ready`]
    pub async fn is_ready(&self, tables: &BTreeSet<String>) -> GateResult<bool> {
        self.router.is_ready(tables).await
    }

    /// Current cluster-wide status, fetched now
    pub async fn status(&self) -> GateResult<StatusSnapshot> {
        self.source.fetch_status().await
    }

    /// Every table the accelerator knows about, fetched now
    pub async fn tables(&self) -> GateResult<Vec<TableState>> {
        self.source.fetch_tables().await
    }

    /// Run this exact statement against the accelerator
    pub async fn raw_query(&self, sql: &str) -> GateResult<Vec<Row>> {
        Ok(self.source.accelerator().raw_query(sql).await?)
    }

    /// Bind `params` into `sql` and run it against the accelerator
    pub async fn raw_query_with(&self, sql: &str, params: &[SqlValue]) -> GateResult<Vec<Row>> {
        self.source.accelerator().raw_query_with(sql, params).await
    }

    /// The query router shared by this client
    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    /// The readiness gate used by `establish`
    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Effective configuration with credentials redacted, if built from one
    pub fn current_config(&self) -> Option<String> {
        self.config.as_ref().map(GateConfig::describe)
    }
}
