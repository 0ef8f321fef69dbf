//! Carousel controller.
//!
//! [`CarouselRuntime`] owns the authoritative slide index and coordinates the
//! layout stabilizer, anchor sizer, orbital animator and accessibility gate.
//! Nothing here runs on its own: the host feeds lifecycle events through
//! [`CarouselRuntime::dispatch`], fires timers with
//! [`CarouselRuntime::fire_timers`] and drives animation with
//! [`CarouselRuntime::animation_frame`], always passing a monotonic timestamp.
//! Derived state is read back through [`CarouselRuntime::view`] and the
//! [`Signal`]s the runtime publishes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::access::{AccessibilityFlags, AccessibilityGate, GatePhase};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::geometry::{Point, Size};
use crate::layout::{AnchorSizer, HeightStabilizer, LayoutVars, SampleOutcome};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::measure::Measurement;
use crate::metrics::EngineMetrics;
use crate::motion::{OrbitFrame, OrbitalAnimator};
use crate::persistence::{SessionStore, SlideIndexStore};

pub mod diagnostics;
pub mod driver;
mod pointer;
mod timers;

pub use pointer::{PointerFollower, PointerState};
pub use timers::{TimerId, TimerKind, TimerQueue};

const RUNTIME_TARGET: &str = "carousel::runtime";

/// Wiring knobs for a runtime instance.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<EngineMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    pub metrics_target: String,
    /// Host delivers [`CarouselEvent::Idle`] when it goes idle.
    pub idle_callbacks: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "carousel::runtime.metrics".to_string(),
            idle_callbacks: false,
        }
    }
}

impl RuntimeConfig {
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(EngineMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<EngineMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum TransitionPhase {
    Idle,
    Transitioning { target: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarouselState {
    pub active_index: usize,
    pub direction: Direction,
    pub phase: TransitionPhase,
}

/// How the session that mounts the carousel started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Navigated back within the session: restore the persisted index.
    Resume,
    /// Hard page load: forget the persisted index and start at 0.
    FreshLoad,
}

/// Inputs from the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CarouselEvent {
    TransitionStart { target: usize },
    TransitionEnd { resolved: usize },
    /// The reference (anchor) element changed size.
    AnchorResized,
    /// The element hosting the orbit changed size.
    ContainerResized,
    ViewportResized(Size),
    /// Block content reflowed (images or fonts loaded).
    ContentChanged,
    PointerMoved(Point),
    PointerEntered,
    PointerLeft,
    /// Host idle callback fired.
    Idle,
}

/// Notifications published by the runtime, in order of occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "signal")]
pub enum Signal {
    Initialized {
        index: usize,
    },
    TransitionRequested {
        from: usize,
        target: usize,
        direction: Direction,
    },
    RequestDropped {
        target: usize,
    },
    TransitionStarted {
        target: usize,
        sweep_started: bool,
    },
    AccessibilityApplied {
        active: usize,
        phase: GatePhase,
    },
    IndexCommitted {
        index: usize,
    },
    SweepFinished {
        angle: f64,
    },
    HeightPublished {
        height: f64,
        exhausted: bool,
    },
    AnchorPublished {
        size: Size,
    },
    Ready,
    DeferredWorkDue,
    TornDown,
}

/// Everything the rendering layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselView {
    pub slide_count: usize,
    pub state: CarouselState,
    pub angle: f64,
    pub radius: f64,
    pub orbit_position: Point,
    /// Marker is mid-sweep.
    pub orbit_active: bool,
    /// Target of the most recent transition start.
    pub orbit_slide: Option<usize>,
    pub anchor: Size,
    pub summary_height: f64,
    pub layout: LayoutVars,
    pub accessibility: Vec<AccessibilityFlags>,
    pub ready: bool,
    pub pointer: PointerState,
}

/// Observer hook for runtime signals.
pub trait CarouselPlugin: Send {
    fn name(&self) -> &str {
        "carousel_plugin"
    }

    fn init(&mut self, _view: &CarouselView) -> Result<()> {
        Ok(())
    }

    fn on_signal(&mut self, _view: &CarouselView, _signal: &Signal) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    TornDown,
}

pub struct CarouselRuntime {
    config: RuntimeConfig,
    slide_count: usize,
    state: CarouselState,
    lifecycle: Lifecycle,
    stabilizer: HeightStabilizer,
    anchor: AnchorSizer,
    orbit: OrbitalAnimator,
    gate: AccessibilityGate,
    pointer: PointerFollower,
    timers: TimerQueue,
    measurement: Arc<dyn Measurement>,
    store: SlideIndexStore,
    plugins: Vec<Box<dyn CarouselPlugin>>,
    signals: Vec<Signal>,
    viewport: Size,
    orbit_slide: Option<usize>,
    ready: bool,
    idle_pending: bool,
    started_at: Option<Duration>,
    last_metrics_emit: Option<Duration>,
}

impl CarouselRuntime {
    pub fn new(
        slide_count: usize,
        measurement: Arc<dyn Measurement>,
        store: Arc<dyn SessionStore>,
        config: RuntimeConfig,
    ) -> Result<Self> {
        if slide_count == 0 {
            return Err(EngineError::EmptySlideSet);
        }
        let engine = &config.engine;
        let store = SlideIndexStore::new(store, engine.controller.storage_key.clone());

        Ok(Self {
            slide_count,
            state: CarouselState {
                active_index: 0,
                direction: Direction::Forward,
                phase: TransitionPhase::Idle,
            },
            lifecycle: Lifecycle::Created,
            stabilizer: HeightStabilizer::new(engine.stabilizer.clone()),
            anchor: AnchorSizer::new(&engine.anchor),
            orbit: OrbitalAnimator::new(engine.orbit.clone()),
            gate: AccessibilityGate::new(slide_count),
            pointer: PointerFollower::new(),
            timers: TimerQueue::new(),
            measurement,
            store,
            plugins: Vec::new(),
            signals: Vec::new(),
            viewport: Size::ZERO,
            orbit_slide: None,
            ready: false,
            idle_pending: false,
            started_at: None,
            last_metrics_emit: None,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn register_plugin<P>(&mut self, plugin: P)
    where
        P: CarouselPlugin + 'static,
    {
        self.plugins.push(Box::new(plugin));
    }

    /// Mount the carousel. Runs once; later calls are ignored.
    pub fn initialize(&mut self, now: Duration, boot: BootMode) {
        if self.lifecycle != Lifecycle::Created {
            return;
        }

        if boot == BootMode::FreshLoad {
            self.store.clear();
        }
        let index = self.store.load(self.slide_count);
        self.state.active_index = index;
        self.lifecycle = Lifecycle::Running;
        self.started_at = Some(now);
        self.last_metrics_emit = Some(now);
        self.ensure_metrics_initialized();

        self.init_plugins();
        self.apply_gate(index, GatePhase::Initialized);

        let controller = &self.config.engine.controller;
        let ready_at = now + controller.settle_delay();
        let fallback_at = now + controller.idle_fallback();
        self.timers.schedule(ready_at, TimerKind::Ready);
        self.idle_pending = true;
        if !self.config.idle_callbacks {
            self.timers.schedule(fallback_at, TimerKind::IdleFallback);
        }

        self.refresh_radius();
        self.refresh_anchor();
        self.arm_stabilizer(now);

        self.log_runtime_event(
            LogLevel::Info,
            "initialized",
            [
                json_kv("index", json!(index)),
                json_kv("slides", json!(self.slide_count)),
                json_kv("fresh_load", json!(boot == BootMode::FreshLoad)),
            ],
        );
        self.emit(Signal::Initialized { index });
    }

    pub fn request_next(&mut self) -> bool {
        let target = (self.state.active_index + 1) % self.slide_count;
        self.request(target, Direction::Forward)
    }

    pub fn request_prev(&mut self) -> bool {
        let target = (self.state.active_index + self.slide_count - 1) % self.slide_count;
        self.request(target, Direction::Backward)
    }

    /// Jump straight to `index` (pagination). Requests for the active slide
    /// or an unknown index are ignored.
    pub fn request_slide(&mut self, index: usize) -> bool {
        if index >= self.slide_count || index == self.state.active_index {
            return false;
        }
        let direction = if index > self.state.active_index {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.request(index, direction)
    }

    fn request(&mut self, target: usize, direction: Direction) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }

        let accepted = self.state.phase == TransitionPhase::Idle;
        self.with_metrics(|metrics| metrics.record_transition_request(accepted));
        if !accepted {
            self.log_runtime_event(
                LogLevel::Debug,
                "request_dropped",
                [json_kv("target", json!(target))],
            );
            self.emit(Signal::RequestDropped { target });
            return false;
        }

        let from = self.state.active_index;
        self.state.phase = TransitionPhase::Transitioning { target };
        self.state.direction = direction;
        self.emit(Signal::TransitionRequested {
            from,
            target,
            direction,
        });
        true
    }

    pub fn dispatch(&mut self, now: Duration, event: CarouselEvent) {
        match self.lifecycle {
            Lifecycle::TornDown => return,
            Lifecycle::Created => {
                if let CarouselEvent::ViewportResized(size) = event {
                    self.viewport = size.clamped();
                }
                return;
            }
            Lifecycle::Running => {}
        }

        self.with_metrics(EngineMetrics::record_event);
        let name = describe_event(&event);

        match event {
            CarouselEvent::TransitionStart { target } => self.on_transition_start(now, target),
            CarouselEvent::TransitionEnd { resolved } => self.on_transition_end(resolved),
            CarouselEvent::AnchorResized => self.refresh_anchor(),
            CarouselEvent::ContainerResized => {
                self.refresh_radius();
            }
            CarouselEvent::ViewportResized(size) => {
                self.viewport = size.clamped();
                self.arm_stabilizer(now);
                self.refresh_anchor();
                self.refresh_radius();
            }
            CarouselEvent::ContentChanged => self.arm_stabilizer(now),
            CarouselEvent::PointerMoved(point) => {
                self.pointer.moved(point);
            }
            CarouselEvent::PointerEntered => {
                self.pointer.set_hover(true);
            }
            CarouselEvent::PointerLeft => {
                self.pointer.set_hover(false);
            }
            CarouselEvent::Idle => self.run_deferred_work(),
        }

        if !is_chatty(name) {
            self.log_runtime_event(
                LogLevel::Debug,
                "event_dispatched",
                [json_kv("event", json!(name))],
            );
        }
        self.maybe_emit_metrics(now);
    }

    fn on_transition_start(&mut self, now: Duration, target: usize) {
        if target >= self.slide_count {
            return;
        }
        if self.state.phase == TransitionPhase::Idle {
            // Started by the rendering layer itself (keyboard, swipe).
            self.state.direction = if target >= self.state.active_index {
                Direction::Forward
            } else {
                Direction::Backward
            };
        }
        self.state.phase = TransitionPhase::Transitioning { target };
        self.apply_gate(target, GatePhase::TransitionStart);

        let sweep_started = self.orbit.start_sweep(now).is_some();
        self.with_metrics(|metrics| metrics.record_sweep_start(sweep_started));
        self.orbit_slide = Some(target);
        self.emit(Signal::TransitionStarted {
            target,
            sweep_started,
        });
    }

    fn on_transition_end(&mut self, resolved: usize) {
        if resolved >= self.slide_count {
            return;
        }
        let changed = resolved != self.state.active_index;
        self.state.active_index = resolved;
        self.state.phase = TransitionPhase::Idle;
        self.apply_gate(resolved, GatePhase::TransitionEnd);

        if changed {
            self.store.save(resolved);
            self.with_metrics(EngineMetrics::record_commit);
            self.log_runtime_event(
                LogLevel::Info,
                "index_committed",
                [json_kv("index", json!(resolved))],
            );
            self.emit(Signal::IndexCommitted { index: resolved });
        }
    }

    /// Run every timer due at `now`.
    pub fn fire_timers(&mut self, now: Duration) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }

        for kind in self.timers.pop_due(now) {
            match kind {
                TimerKind::StabilizerPoll { generation } => self.sample_heights(now, generation),
                TimerKind::Ready => {
                    self.ready = true;
                    self.pointer.enable();
                    self.log_runtime_event(LogLevel::Info, "ready", std::iter::empty());
                    self.emit(Signal::Ready);
                }
                TimerKind::IdleFallback => self.run_deferred_work(),
            }
        }
        self.maybe_emit_metrics(now);
    }

    /// Advance the orbit sweep. Returns `None` when nothing is animating.
    pub fn animation_frame(&mut self, now: Duration) -> Option<OrbitFrame> {
        if self.lifecycle != Lifecycle::Running || !self.orbit.is_animating() {
            return None;
        }

        let frame = self.orbit.frame(now);
        if frame.finished {
            self.with_metrics(EngineMetrics::record_sweep_complete);
            self.emit(Signal::SweepFinished { angle: frame.angle });
        }
        Some(frame)
    }

    /// Release every timer and stop all motion. Later calls are no-ops.
    pub fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.timers.clear();
        self.stabilizer.cancel();
        self.orbit.cancel();
        self.pointer.disable();
        self.idle_pending = false;
        self.lifecycle = Lifecycle::TornDown;
        self.log_runtime_event(LogLevel::Info, "torn_down", std::iter::empty());
        self.emit(Signal::TornDown);
    }

    fn run_deferred_work(&mut self) {
        if !self.idle_pending {
            return;
        }
        self.idle_pending = false;
        self.timers
            .cancel_matching(|kind| matches!(kind, TimerKind::IdleFallback));
        self.emit(Signal::DeferredWorkDue);
    }

    fn arm_stabilizer(&mut self, now: Duration) {
        self.timers
            .cancel_matching(|kind| matches!(kind, TimerKind::StabilizerPoll { .. }));
        let generation = self.stabilizer.arm();
        self.sample_heights(now, generation);
    }

    fn sample_heights(&mut self, now: Duration, generation: u64) {
        let Some(heights) = self.measurement.block_heights() else {
            self.stabilizer.cancel();
            self.log_runtime_event(
                LogLevel::Debug,
                "measurement_unavailable",
                [json_kv("source", json!("blocks"))],
            );
            return;
        };

        self.with_metrics(EngineMetrics::record_sample);
        match self.stabilizer.sample(generation, &heights) {
            SampleOutcome::Stale => {}
            SampleOutcome::Retry { generation, delay } => {
                self.timers
                    .schedule(now + delay, TimerKind::StabilizerPoll { generation });
            }
            SampleOutcome::Published(done) => {
                self.with_metrics(|metrics| metrics.record_stabilized(done.exhausted));
                self.log_runtime_event(
                    LogLevel::Debug,
                    "height_stabilized",
                    [
                        json_kv("height", json!(done.height)),
                        json_kv("samples", json!(done.samples)),
                        json_kv("exhausted", json!(done.exhausted)),
                    ],
                );
                self.emit(Signal::HeightPublished {
                    height: done.height,
                    exhausted: done.exhausted,
                });
                if done.changed {
                    self.refresh_anchor();
                }
            }
        }
    }

    fn refresh_anchor(&mut self) {
        let Some(size) = self.anchor.observe(self.measurement.anchor_box()) else {
            return;
        };
        self.with_metrics(EngineMetrics::record_anchor_publish);
        self.orbit.rest_for_anchor(size);
        self.refresh_radius();
        self.emit(Signal::AnchorPublished { size });
    }

    fn refresh_radius(&mut self) -> Point {
        let container = self.measurement.orbit_container();
        self.orbit.resize(container)
    }

    fn apply_gate(&mut self, active: usize, phase: GatePhase) {
        self.gate.apply(active, phase);
        self.emit(Signal::AccessibilityApplied { active, phase });
    }

    pub fn view(&self) -> CarouselView {
        let anchor = self.anchor.size();
        let summary_height = self.stabilizer.height();
        CarouselView {
            slide_count: self.slide_count,
            state: self.state,
            angle: self.orbit.angle(),
            radius: self.orbit.radius(),
            orbit_position: self.orbit.position(),
            orbit_active: self.orbit.is_animating(),
            orbit_slide: self.orbit_slide,
            anchor,
            summary_height,
            layout: LayoutVars::derive(anchor, summary_height, self.viewport),
            accessibility: self.gate.flags().to_vec(),
            ready: self.ready,
            pointer: self.pointer.state(),
        }
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.state.active_index
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn angle(&self) -> f64 {
        self.orbit.angle()
    }

    pub fn is_animating(&self) -> bool {
        self.orbit.is_animating()
    }

    pub fn stabilized_height(&self) -> f64 {
        self.stabilizer.height()
    }

    pub fn is_stabilizing(&self) -> bool {
        self.stabilizer.is_polling()
    }

    pub fn anchor_size(&self) -> Size {
        self.anchor.size()
    }

    pub fn accessibility(&self) -> &[AccessibilityFlags] {
        self.gate.flags()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle == Lifecycle::TornDown
    }

    /// True while the host should keep delivering animation frames.
    pub fn wants_frame(&self) -> bool {
        self.lifecycle == Lifecycle::Running && self.orbit.is_animating()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Drain the signals published since the last call.
    pub fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    fn emit(&mut self, signal: Signal) {
        if !self.plugins.is_empty() {
            let view = self.view();
            let mut failures = Vec::new();
            for plugin in self.plugins.iter_mut() {
                if let Err(err) = plugin.on_signal(&view, &signal) {
                    failures.push((plugin.name().to_string(), err.to_string()));
                }
            }
            self.log_plugin_failures(failures);
        }
        self.signals.push(signal);
    }

    fn init_plugins(&mut self) {
        let view = self.view();
        let mut failures = Vec::new();
        for plugin in self.plugins.iter_mut() {
            if let Err(err) = plugin.init(&view) {
                failures.push((plugin.name().to_string(), err.to_string()));
            }
        }
        self.log_plugin_failures(failures);
    }

    fn log_plugin_failures(&self, failures: Vec<(String, String)>) {
        for (plugin, error) in failures {
            self.log_runtime_event(
                LogLevel::Warn,
                "plugin_failed",
                [
                    json_kv("plugin", json!(plugin)),
                    json_kv("error", json!(error)),
                ],
            );
        }
    }

    fn ensure_metrics_initialized(&mut self) {
        if self.config.metrics.is_none() && self.config.metrics_interval > Duration::ZERO {
            self.config.enable_metrics();
        }
    }

    fn with_metrics(&self, record: impl FnOnce(&mut EngineMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self, now: Duration) {
        if self.config.metrics_interval == Duration::ZERO {
            return;
        }
        match self.last_metrics_emit {
            Some(last) if now.saturating_sub(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }

        let uptime = self
            .started_at
            .map(|start| now.saturating_sub(start))
            .unwrap_or_default();
        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(uptime)
                    .to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref().filter(|l| l.enabled(level)) {
            let event = event_with_fields(level, RUNTIME_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

fn describe_event(event: &CarouselEvent) -> &'static str {
    match event {
        CarouselEvent::TransitionStart { .. } => "transition_start",
        CarouselEvent::TransitionEnd { .. } => "transition_end",
        CarouselEvent::AnchorResized => "anchor_resized",
        CarouselEvent::ContainerResized => "container_resized",
        CarouselEvent::ViewportResized(_) => "viewport_resized",
        CarouselEvent::ContentChanged => "content_changed",
        CarouselEvent::PointerMoved(_) => "pointer_moved",
        CarouselEvent::PointerEntered => "pointer_entered",
        CarouselEvent::PointerLeft => "pointer_left",
        CarouselEvent::Idle => "idle",
    }
}

fn is_chatty(name: &str) -> bool {
    name == "pointer_moved"
}

#[cfg(test)]
mod tests;
