use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::EngineMetrics;

use super::{CarouselPlugin, CarouselView, Signal};

/// Writes every runtime signal to a logger, one event per signal.
pub struct LifecycleLoggerPlugin {
    logger: Logger,
    level: LogLevel,
    log_accessibility: bool,
    log_layout: bool,
}

impl LifecycleLoggerPlugin {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_accessibility: false,
            log_layout: true,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Gate updates fire twice per transition; off by default.
    pub fn log_accessibility(mut self, enabled: bool) -> Self {
        self.log_accessibility = enabled;
        self
    }

    pub fn log_layout(mut self, enabled: bool) -> Self {
        self.log_layout = enabled;
        self
    }

    fn emit(&self, message: &str, fields: impl IntoIterator<Item = (String, serde_json::Value)>) {
        let event = event_with_fields(self.level, "carousel::runtime.lifecycle", message, fields);
        let _ = self.logger.log_event(event);
    }
}

impl CarouselPlugin for LifecycleLoggerPlugin {
    fn name(&self) -> &str {
        "lifecycle_logger"
    }

    fn init(&mut self, view: &CarouselView) -> Result<()> {
        self.emit(
            "plugin_initialized",
            [
                json_kv("slides", json!(view.slide_count)),
                json_kv("logger_level", json!(format!("{:?}", self.level))),
            ],
        );
        Ok(())
    }

    fn on_signal(&mut self, view: &CarouselView, signal: &Signal) -> Result<()> {
        let layout_signal = matches!(
            signal,
            Signal::HeightPublished { .. } | Signal::AnchorPublished { .. }
        );
        if layout_signal && !self.log_layout {
            return Ok(());
        }
        if matches!(signal, Signal::AccessibilityApplied { .. }) && !self.log_accessibility {
            return Ok(());
        }

        let payload =
            serde_json::to_value(signal).unwrap_or_else(|_| json!(format!("{signal:?}")));
        self.emit(
            "signal",
            [
                json_kv("signal", payload),
                json_kv("active_index", json!(view.state.active_index)),
                json_kv("angle", json!(view.angle)),
            ],
        );
        Ok(())
    }
}

/// Logs a metrics snapshot every `every` signals, plus a final one on
/// teardown.
pub struct MetricsSnapshotPlugin {
    logger: Logger,
    metrics: Arc<Mutex<EngineMetrics>>,
    target: String,
    every: u64,
    seen: u64,
    mounted_at: Instant,
}

impl MetricsSnapshotPlugin {
    pub fn new(logger: Logger, metrics: Arc<Mutex<EngineMetrics>>) -> Self {
        Self {
            logger,
            metrics,
            target: "carousel::runtime.metrics".to_string(),
            every: 64,
            seen: 0,
            mounted_at: Instant::now(),
        }
    }

    /// Zero disables the periodic snapshots; teardown still logs one.
    pub fn every(mut self, signals: u64) -> Self {
        self.every = signals;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    fn due(&mut self, signal: &Signal) -> bool {
        self.seen = self.seen.saturating_add(1);
        matches!(signal, Signal::TornDown) || (self.every > 0 && self.seen % self.every == 0)
    }

    fn log_snapshot(&self) {
        let Ok(metrics) = self.metrics.lock() else {
            return;
        };
        let mut event = metrics
            .snapshot(self.mounted_at.elapsed())
            .to_log_event(&self.target);
        event.fields.insert("signals_seen".into(), json!(self.seen));
        let _ = self.logger.log_event(event);
    }
}

impl CarouselPlugin for MetricsSnapshotPlugin {
    fn name(&self) -> &str {
        "metrics_snapshot"
    }

    fn init(&mut self, _view: &CarouselView) -> Result<()> {
        self.mounted_at = Instant::now();
        self.seen = 0;
        Ok(())
    }

    fn on_signal(&mut self, _view: &CarouselView, signal: &Signal) -> Result<()> {
        if self.due(signal) {
            self.log_snapshot();
        }
        Ok(())
    }
}
