//! readyset-gate - readiness gating and query routing for a ReadySet accelerator
//!
//! The accelerator is never treated as authoritative until it has proven,
//! by polling its status surface, that snapshotting has completed. Each query
//! is then routed to the accelerator only when every table it references is
//! fully snapshotted; anything else goes to the primary database.

pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod readiness;
pub mod routing;
pub mod status;
pub mod transport;

pub use client::ReadySetClient;
pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use readiness::{BackoffPolicy, ReadinessConfig, ReadinessGate, UnreachablePolicy};
pub use routing::{CacheConfig, Destination, QueryRouter, RouteReason, RoutingDecision, TableStateCache};
pub use status::{NotReplicatedError, StatusSnapshot, StatusSource, TableState, TableStatus};
pub use transport::{Accelerator, MemoryExecutor, QueryExecutor, Row, SqlValue, TransportError};
