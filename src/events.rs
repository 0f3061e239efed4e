//! Diagnostic event sinks
//!
//! Both the resolver and the prober report failures through an [`EventSink`]
//! handed to them at construction. Nothing reads these events back for
//! control flow.

use parking_lot::Mutex;
use std::fmt;

/// A single failure diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Component label, e.g. `geo` or `probe`
    pub label: &'static str,
    pub message: String,
    pub error: Option<String>,
}

impl DiagnosticEvent {
    pub fn new(label: &'static str, message: impl Into<String>) -> Self {
        Self {
            label,
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "| {} | {} | error: {}", self.label, self.message, error),
            None => write!(f, "| {} | {}", self.label, self.message),
        }
    }
}

/// Receiver for diagnostic events
pub trait EventSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing` at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        match &event.error {
            Some(error) => tracing::warn!(label = event.label, error = %error, "{}", event.message),
            None => tracing::warn!(label = event.label, "{}", event.message),
        }
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: DiagnosticEvent) {}
}

/// Keeps events in memory so they can be inspected later
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = DiagnosticEvent::new("geo", "lookup failed").with_error("file not found");
        assert_eq!(event.to_string(), "| geo | lookup failed | error: file not found");

        let event = DiagnosticEvent::new("probe", "setup failed");
        assert_eq!(event.to_string(), "| probe | setup failed");
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.record(DiagnosticEvent::new("geo", "first"));
        sink.record(DiagnosticEvent::new("probe", "second"));

        let events = sink.events();
        assert_eq!(sink.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(events[1].label, "probe");
    }
}
