//! Typed telemetry events, separated from stage logic.
//!
//! Stages append events to a [`TelemetrySink`]; tests assert on the
//! recorded events instead of log output, and production wires the sink
//! to `tracing`.

use std::sync::Mutex;

use crate::types::card::ExtractionMethod;
use crate::types::outcome::FallbackKind;

/// One observable event from a ladder run.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    StageAttempted {
        stage: &'static str,
    },
    StageSucceeded {
        stage: &'static str,
        cost_cents: u32,
    },
    StageFailed {
        stage: &'static str,
        reason: String,
    },
    CacheHit {
        key: String,
    },
    QuotaDenied {
        scope: String,
        reason: String,
    },
    BudgetReserved {
        user_id: String,
        minutes: u32,
    },
    BudgetDenied {
        user_id: String,
        reason: String,
    },
    BudgetCommitted {
        user_id: String,
        minutes: u32,
    },
    FallbackReturned {
        kind: FallbackKind,
        reason: String,
    },
    LadderCompleted {
        method: ExtractionMethod,
        ingredient_count: usize,
        confidence: f32,
        total_cost_cents: u32,
    },
}

/// Append-only event consumer.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Collects events in memory for test assertions.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of stages that were attempted, in order.
    pub fn attempted_stages(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::StageAttempted { stage } => Some(*stage),
                _ => None,
            })
            .collect()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Forwards events to `tracing` for production logging.
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::StageAttempted { stage } => {
                tracing::debug!(stage, "stage attempted");
            }
            TelemetryEvent::StageSucceeded { stage, cost_cents } => {
                tracing::info!(stage, cost_cents, "stage succeeded");
            }
            TelemetryEvent::StageFailed { stage, reason } => {
                tracing::debug!(stage, reason, "stage failed, falling through");
            }
            TelemetryEvent::CacheHit { key } => {
                tracing::info!(key, "cache hit");
            }
            TelemetryEvent::QuotaDenied { scope, reason } => {
                tracing::info!(scope, reason, "quota denied");
            }
            TelemetryEvent::BudgetReserved { user_id, minutes } => {
                tracing::debug!(user_id, minutes, "budget reserved");
            }
            TelemetryEvent::BudgetDenied { user_id, reason } => {
                tracing::info!(user_id, reason, "budget denied");
            }
            TelemetryEvent::BudgetCommitted { user_id, minutes } => {
                tracing::info!(user_id, minutes, "budget committed");
            }
            TelemetryEvent::FallbackReturned { kind, reason } => {
                tracing::info!(?kind, reason, "fallback returned");
            }
            TelemetryEvent::LadderCompleted {
                method,
                ingredient_count,
                confidence,
                total_cost_cents,
            } => {
                tracing::info!(
                    ?method,
                    ingredient_count,
                    confidence,
                    total_cost_cents,
                    "ladder completed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.record(TelemetryEvent::StageAttempted { stage: "cache_check" });
        sink.record(TelemetryEvent::StageAttempted { stage: "metadata" });

        assert_eq!(sink.attempted_stages(), vec!["cache_check", "metadata"]);
        assert_eq!(sink.events().len(), 2);
    }
}
