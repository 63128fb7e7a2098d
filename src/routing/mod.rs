//! Query Routing
//!
//! Per-table readiness drives the destination of every query:
//! - [`TableStateCache`] keeps one consistent bulk fetch of table states,
//!   refreshed at most once at a time and only when stale or incomplete
//! - [`QueryRouter`] sends a query to the accelerator only when every table
//!   it references is snapshotted; anything else goes to the primary
//!
//! Transport failures are never turned into a routing decision.

mod cache;
mod router;

pub use cache::{CacheConfig, TableStateCache};
pub use router::{Destination, QueryRouter, RouteReason, RoutingDecision};
