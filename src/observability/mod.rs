//! Observability
//!
//! Structured, one-line-per-event JSON logging:
//! - Explicit severity levels with a process-wide floor
//! - A closed vocabulary of typed events
//! - Deterministic key ordering
//!
//! # Usage
//!
//! ```ignore
//! use readyset_gate::observability::{Event, Logger};
//!
//! Logger::info(Event::ReadinessReady.as_str(), &[("attempts", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{set_min_severity, Logger, Severity};

/// Log a typed event with fields at the event's default severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
