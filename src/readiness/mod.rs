//! Readiness Gate
//!
//! Connection establishment blocks here until the accelerator reports that
//! snapshotting has completed, or fails once its attempt budget or deadline
//! is spent.
//!
//! The gate has exactly two terminal outcomes:
//! - `Polling -> Ready`: a status poll reported `Snapshot Status = Completed`
//! - `Polling -> Failed`: budget exhausted, surfaced as `GateError::NotReady`
//!
//! Transport failures while polling count as "not ready yet" unless the
//! [`UnreachablePolicy`] says otherwise.

mod backoff;
mod gate;

pub use backoff::{with_jitter, BackoffPolicy};
pub use gate::{ReadinessConfig, ReadinessGate, UnreachablePolicy};
