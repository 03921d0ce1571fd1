//! Usage metering interface.
//!
//! The core produces accurate token counts per operation; turning them into
//! cost is an external concern. Sinks must be cheap and non-blocking —
//! recording happens on request paths.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Operation kinds the core meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterEventKind {
    Indexed,
    Question,
    PrReview,
    SnippetFetch,
}

/// One metered operation.
#[derive(Debug, Clone, Serialize)]
pub struct UsageEvent {
    pub event: MeterEventKind,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub embedding_tokens: u64,
    pub metadata: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(event: MeterEventKind) -> Self {
        Self {
            event,
            input_tokens: 0,
            output_tokens: 0,
            embedding_tokens: 0,
            metadata: serde_json::Value::Null,
            recorded_at: Utc::now(),
        }
    }

    pub fn tokens(mut self, input: u64, output: u64, embedding: u64) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self.embedding_tokens = embedding;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Sink for usage events.
pub trait MeteringSink: Send + Sync {
    fn record(&self, event: UsageEvent);
}

/// Default sink: structured log lines, nothing persisted.
#[derive(Debug, Default)]
pub struct TracingMeteringSink;

impl MeteringSink for TracingMeteringSink {
    fn record(&self, event: UsageEvent) {
        tracing::info!(
            event = ?event.event,
            input_tokens = event.input_tokens,
            output_tokens = event.output_tokens,
            embedding_tokens = event.embedding_tokens,
            "usage recorded"
        );
    }
}

/// In-memory sink for tests and local inspection.
#[derive(Debug, Default)]
pub struct MemoryMeteringSink {
    events: std::sync::Mutex<Vec<UsageEvent>>,
}

impl MemoryMeteringSink {
    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().expect("metering lock").clone()
    }
}

impl MeteringSink for MemoryMeteringSink {
    fn record(&self, event: UsageEvent) {
        self.events.lock().expect("metering lock").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_accumulates_events() {
        let sink = MemoryMeteringSink::default();
        sink.record(
            UsageEvent::new(MeterEventKind::Question)
                .tokens(120, 40, 0)
                .metadata(serde_json::json!({"repo": "acme/shop"})),
        );
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].input_tokens, 120);
        assert_eq!(events[0].metadata["repo"], "acme/shop");
    }
}
