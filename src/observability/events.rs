//! Observable events
//!
//! Every log line carries one of these as its `event` key.

use std::fmt;

use super::logger::Severity;

/// Events emitted by the gate, the cache and the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Readiness
    /// One status poll was made
    ReadinessPoll,
    /// A poll failed at the transport level
    ReadinessUnreachable,
    /// Snapshotting completed; the accelerator may be used
    ReadinessReady,
    /// The attempt budget or deadline ran out
    ReadinessFailed,

    // Table cache
    /// Bulk table refresh completed
    TableCacheRefresh,
    /// Bulk table refresh failed or timed out
    TableCacheRefreshFailed,

    // Routing
    /// A routing decision was made
    RouteDecided,

    // Status parsing
    /// A status field could not be interpreted and was treated as absent
    StatusFieldUnparsed,

    // Transport
    /// A raw statement was sent to the accelerator
    RawQuery,

    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,
}

impl Event {
    /// Stable event name written as the `event` key
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ReadinessPoll => "READINESS_POLL",
            Event::ReadinessUnreachable => "READINESS_UNREACHABLE",
            Event::ReadinessReady => "READINESS_READY",
            Event::ReadinessFailed => "READINESS_FAILED",
            Event::TableCacheRefresh => "TABLE_CACHE_REFRESH",
            Event::TableCacheRefreshFailed => "TABLE_CACHE_REFRESH_FAILED",
            Event::RouteDecided => "ROUTE_DECIDED",
            Event::StatusFieldUnparsed => "STATUS_FIELD_UNPARSED",
            Event::RawQuery => "RAW_QUERY",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Default severity for this event
    pub fn severity(&self) -> Severity {
        match self {
            Event::ReadinessPoll | Event::RouteDecided | Event::RawQuery => Severity::Trace,
            Event::ReadinessUnreachable | Event::StatusFieldUnparsed => Severity::Warn,
            Event::ReadinessFailed | Event::TableCacheRefreshFailed => Severity::Error,
            Event::ReadinessReady | Event::TableCacheRefresh | Event::ConfigLoaded => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        for event in [Event::ReadinessPoll, Event::TableCacheRefreshFailed, Event::RouteDecided] {
            assert!(event
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failures_are_errors() {
        assert_eq!(Event::ReadinessFailed.severity(), Severity::Error);
        assert_eq!(Event::TableCacheRefreshFailed.severity(), Severity::Error);
    }
}
