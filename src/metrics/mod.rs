use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Saturating counters for everything the controller decides.
#[derive(Debug, Default, Clone)]
pub struct EngineMetrics {
    events: u64,
    transitions_requested: u64,
    transitions_dropped: u64,
    transitions_committed: u64,
    sweeps_started: u64,
    sweeps_rejected: u64,
    sweeps_completed: u64,
    stabilizer_samples: u64,
    stabilizer_converged: u64,
    stabilizer_exhausted: u64,
    anchor_publishes: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_transition_request(&mut self, accepted: bool) {
        if accepted {
            self.transitions_requested = self.transitions_requested.saturating_add(1);
        } else {
            self.transitions_dropped = self.transitions_dropped.saturating_add(1);
        }
    }

    pub fn record_commit(&mut self) {
        self.transitions_committed = self.transitions_committed.saturating_add(1);
    }

    pub fn record_sweep_start(&mut self, started: bool) {
        if started {
            self.sweeps_started = self.sweeps_started.saturating_add(1);
        } else {
            self.sweeps_rejected = self.sweeps_rejected.saturating_add(1);
        }
    }

    pub fn record_sweep_complete(&mut self) {
        self.sweeps_completed = self.sweeps_completed.saturating_add(1);
    }

    pub fn record_sample(&mut self) {
        self.stabilizer_samples = self.stabilizer_samples.saturating_add(1);
    }

    pub fn record_stabilized(&mut self, exhausted: bool) {
        if exhausted {
            self.stabilizer_exhausted = self.stabilizer_exhausted.saturating_add(1);
        } else {
            self.stabilizer_converged = self.stabilizer_converged.saturating_add(1);
        }
    }

    pub fn record_anchor_publish(&mut self) {
        self.anchor_publishes = self.anchor_publishes.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            transitions_requested: self.transitions_requested,
            transitions_dropped: self.transitions_dropped,
            transitions_committed: self.transitions_committed,
            sweeps_started: self.sweeps_started,
            sweeps_rejected: self.sweeps_rejected,
            sweeps_completed: self.sweeps_completed,
            stabilizer_samples: self.stabilizer_samples,
            stabilizer_converged: self.stabilizer_converged,
            stabilizer_exhausted: self.stabilizer_exhausted,
            anchor_publishes: self.anchor_publishes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub transitions_requested: u64,
    pub transitions_dropped: u64,
    pub transitions_committed: u64,
    pub sweeps_started: u64,
    pub sweeps_rejected: u64,
    pub sweeps_completed: u64,
    pub stabilizer_samples: u64,
    pub stabilizer_converged: u64,
    pub stabilizer_exhausted: u64,
    pub anchor_publishes: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".into(), json!(self.uptime_ms));
        map.insert("events".into(), json!(self.events));
        map.insert("transitions_requested".into(), json!(self.transitions_requested));
        map.insert("transitions_dropped".into(), json!(self.transitions_dropped));
        map.insert("transitions_committed".into(), json!(self.transitions_committed));
        map.insert("sweeps_started".into(), json!(self.sweeps_started));
        map.insert("sweeps_rejected".into(), json!(self.sweeps_rejected));
        map.insert("sweeps_completed".into(), json!(self.sweeps_completed));
        map.insert("stabilizer_samples".into(), json!(self.stabilizer_samples));
        map.insert("stabilizer_converged".into(), json!(self.stabilizer_converged));
        map.insert("stabilizer_exhausted".into(), json!(self.stabilizer_exhausted));
        map.insert("anchor_publishes".into(), json!(self.anchor_publishes));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "engine_metrics", self.as_fields())
    }
}
