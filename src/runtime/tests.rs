use std::sync::Arc;
use std::time::Duration;

use super::driver::SimulatedHost;
use super::*;
use crate::logging::MemorySink;
use crate::measure::{MeasuredLayout, SharedMeasurement};
use crate::persistence::{MemorySessionStore, SLIDE_INDEX_KEY};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

struct Fixture {
    runtime: CarouselRuntime,
    measurement: SharedMeasurement,
    store: MemorySessionStore,
}

fn default_layout() -> MeasuredLayout {
    MeasuredLayout {
        blocks: Some(vec![120.0, 80.0]),
        anchor: Some(Size::new(300.0, 180.0)),
        container: Some(Size::new(400.0, 400.0)),
    }
}

fn build(
    slides: usize,
    layout: MeasuredLayout,
    store: MemorySessionStore,
    config: RuntimeConfig,
) -> Fixture {
    let measurement = SharedMeasurement::new(layout);
    let runtime = CarouselRuntime::new(
        slides,
        Arc::new(measurement.clone()),
        Arc::new(store.clone()),
        config,
    )
    .expect("runtime");
    Fixture {
        runtime,
        measurement,
        store,
    }
}

fn fixture(slides: usize) -> Fixture {
    build(
        slides,
        default_layout(),
        MemorySessionStore::new(),
        RuntimeConfig::default(),
    )
}

fn started(slides: usize) -> Fixture {
    let mut fx = fixture(slides);
    fx.runtime.initialize(ms(0), BootMode::Resume);
    fx.runtime.take_signals();
    fx
}

/// Fire stabilizer polls until the in-flight run publishes.
fn settle(runtime: &mut CarouselRuntime, mut now: Duration) -> Duration {
    while runtime.is_stabilizing() {
        now += ms(300);
        runtime.fire_timers(now);
    }
    now
}

/// Run one full transition through the simulated host.
fn transition(
    runtime: &mut CarouselRuntime,
    host: &mut SimulatedHost,
    now: Duration,
    request: impl FnOnce(&mut CarouselRuntime) -> bool,
) -> Duration {
    assert!(request(runtime), "request should be accepted while idle");
    host.pump(runtime, now);
    let end = now + ms(2000);
    host.pump(runtime, end);
    end
}

fn assert_single_focus(runtime: &CarouselRuntime) {
    let flags = runtime.accessibility();
    let focusable: Vec<usize> = (0..flags.len()).filter(|i| flags[*i].focusable).collect();
    let current: Vec<usize> = (0..flags.len()).filter(|i| flags[*i].current).collect();
    assert_eq!(focusable, vec![runtime.active_index()]);
    assert_eq!(current, vec![runtime.active_index()]);
    assert!(
        flags
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != runtime.active_index())
            .all(|(_, f)| f.is_inert())
    );
}

#[test]
fn zero_slides_is_rejected() {
    let measurement = SharedMeasurement::default();
    let result = CarouselRuntime::new(
        0,
        Arc::new(measurement),
        Arc::new(MemorySessionStore::new()),
        RuntimeConfig::default(),
    );
    assert!(matches!(result, Err(EngineError::EmptySlideSet)));
}

#[test]
fn next_wraps_around_and_prev_inverts_it() {
    let store = MemorySessionStore::new();
    store.set(SLIDE_INDEX_KEY, "2");
    let mut fx = build(5, default_layout(), store, RuntimeConfig::default());
    fx.runtime.initialize(ms(0), BootMode::Resume);
    assert_eq!(fx.runtime.active_index(), 2);

    let mut host = SimulatedHost::new(ms(2000));
    let mut now = ms(0);
    let mut visited = Vec::new();
    for _ in 0..5 {
        now = transition(&mut fx.runtime, &mut host, now, CarouselRuntime::request_next);
        visited.push(fx.runtime.active_index());
        assert_single_focus(&fx.runtime);
    }
    assert_eq!(visited, vec![3, 4, 0, 1, 2]);

    for _ in 0..5 {
        now = transition(&mut fx.runtime, &mut host, now, CarouselRuntime::request_prev);
        assert_single_focus(&fx.runtime);
    }
    assert_eq!(fx.runtime.active_index(), 2);

    now = transition(&mut fx.runtime, &mut host, now, CarouselRuntime::request_prev);
    transition(&mut fx.runtime, &mut host, now, CarouselRuntime::request_next);
    assert_eq!(fx.runtime.active_index(), 2);
}

#[test]
fn requests_mid_transition_are_dropped() {
    let mut fx = started(4);
    fx.runtime.config.enable_metrics();
    let metrics = fx.runtime.config().metrics_handle().unwrap();

    assert!(fx.runtime.request_next());
    assert!(!fx.runtime.request_next());
    assert!(!fx.runtime.request_prev());
    assert!(!fx.runtime.request_slide(3));
    assert_eq!(
        fx.runtime.state().phase,
        TransitionPhase::Transitioning { target: 1 }
    );

    let signals = fx.runtime.take_signals();
    let dropped = signals
        .iter()
        .filter(|s| matches!(s, Signal::RequestDropped { .. }))
        .count();
    assert_eq!(dropped, 3);
    assert_eq!(metrics.lock().unwrap().snapshot(ms(0)).transitions_dropped, 3);

    fx.runtime
        .dispatch(ms(10), CarouselEvent::TransitionStart { target: 1 });
    fx.runtime
        .dispatch(ms(2010), CarouselEvent::TransitionEnd { resolved: 1 });
    assert!(fx.runtime.request_next());
}

#[test]
fn transition_start_gates_target_and_starts_sweep() {
    let mut fx = started(3);
    assert!(fx.runtime.request_next());
    fx.runtime
        .dispatch(ms(100), CarouselEvent::TransitionStart { target: 1 });

    let flags = fx.runtime.accessibility();
    assert!(flags[1].focusable);
    assert!(flags[0].is_inert());
    // The current marker has not moved yet.
    assert!(!flags[1].current);

    let view = fx.runtime.view();
    assert!(view.orbit_active);
    assert_eq!(view.orbit_slide, Some(1));
    assert!(fx.runtime.wants_frame());

    let signals = fx.runtime.take_signals();
    assert!(signals.contains(&Signal::TransitionStarted {
        target: 1,
        sweep_started: true
    }));
}

#[test]
fn second_sweep_request_keeps_in_flight_trajectory() {
    let mut fx = started(3);
    fx.runtime
        .dispatch(ms(0), CarouselEvent::TransitionStart { target: 1 });
    fx.runtime.animation_frame(ms(500));
    let before = fx.runtime.angle();

    fx.runtime
        .dispatch(ms(600), CarouselEvent::TransitionStart { target: 2 });
    assert_eq!(fx.runtime.angle(), before);
    let signals = fx.runtime.take_signals();
    assert!(signals.contains(&Signal::TransitionStarted {
        target: 2,
        sweep_started: false
    }));

    let frame = fx.runtime.animation_frame(ms(1000)).unwrap();
    assert!((frame.angle - (-65.0 - 180.0)).abs() < 1e-9);
    let done = fx.runtime.animation_frame(ms(2000)).unwrap();
    assert!(done.finished);
    assert_eq!(done.angle, -65.0);
    assert!(fx.runtime.animation_frame(ms(2100)).is_none());
}

#[test]
fn angle_does_not_drift_over_many_transitions() {
    let mut fx = started(3);
    let mut host = SimulatedHost::new(ms(2000));
    let mut now = ms(0);
    for _ in 0..500 {
        now = transition(&mut fx.runtime, &mut host, now, CarouselRuntime::request_next);
    }
    assert_eq!(fx.runtime.angle(), -65.0);
    assert!(!fx.runtime.is_animating());
}

#[test]
fn committed_index_is_persisted_and_restored() {
    let mut fx = started(6);
    let mut host = SimulatedHost::new(ms(2000));
    transition(&mut fx.runtime, &mut host, ms(0), |rt| rt.request_slide(3));
    assert_eq!(fx.store.get(SLIDE_INDEX_KEY).as_deref(), Some("3"));

    let mut again = build(
        6,
        default_layout(),
        fx.store.clone(),
        RuntimeConfig::default(),
    );
    again.runtime.initialize(ms(0), BootMode::Resume);
    assert_eq!(again.runtime.active_index(), 3);
    assert!(again.runtime.accessibility()[3].focusable);
}

#[test]
fn fresh_load_forgets_persisted_index() {
    let store = MemorySessionStore::new();
    store.set(SLIDE_INDEX_KEY, "4");
    let mut fx = build(6, default_layout(), store, RuntimeConfig::default());
    fx.runtime.initialize(ms(0), BootMode::FreshLoad);
    assert_eq!(fx.runtime.active_index(), 0);
    assert_eq!(fx.store.get(SLIDE_INDEX_KEY), None);
}

#[test]
fn unusable_persisted_index_falls_back_to_zero() {
    for raw in ["abc", "9", "-2", ""] {
        let store = MemorySessionStore::new();
        store.set(SLIDE_INDEX_KEY, raw);
        let mut fx = build(3, default_layout(), store, RuntimeConfig::default());
        fx.runtime.initialize(ms(0), BootMode::Resume);
        assert_eq!(fx.runtime.active_index(), 0, "raw value {raw:?}");
    }
}

#[test]
fn unchanged_resolution_does_not_write_store() {
    let mut fx = started(3);
    fx.runtime
        .dispatch(ms(0), CarouselEvent::TransitionStart { target: 0 });
    fx.runtime
        .dispatch(ms(10), CarouselEvent::TransitionEnd { resolved: 0 });
    assert_eq!(fx.store.get(SLIDE_INDEX_KEY), None);
    assert_single_focus(&fx.runtime);
}

#[test]
fn out_of_range_lifecycle_indices_are_ignored() {
    let mut fx = started(3);
    fx.runtime
        .dispatch(ms(0), CarouselEvent::TransitionStart { target: 7 });
    assert_eq!(fx.runtime.state().phase, TransitionPhase::Idle);
    assert!(!fx.runtime.is_animating());
    fx.runtime
        .dispatch(ms(0), CarouselEvent::TransitionEnd { resolved: 3 });
    assert_eq!(fx.runtime.active_index(), 0);
}

#[test]
fn stabilized_height_publishes_observed_peak() {
    let layout = MeasuredLayout {
        blocks: Some(vec![100.0]),
        ..default_layout()
    };
    let mut fx = build(3, layout, MemorySessionStore::new(), RuntimeConfig::default());
    fx.runtime.initialize(ms(0), BootMode::Resume);
    assert!(fx.runtime.is_stabilizing());

    fx.measurement.set_blocks(vec![101.0]);
    fx.runtime.fire_timers(ms(300));
    assert!(fx.runtime.is_stabilizing());
    fx.measurement.set_blocks(vec![100.0]);
    fx.runtime.fire_timers(ms(600));

    assert!(!fx.runtime.is_stabilizing());
    assert_eq!(fx.runtime.stabilized_height(), 101.0);
    assert!(fx.runtime.take_signals().contains(&Signal::HeightPublished {
        height: 101.0,
        exhausted: false
    }));
    assert_eq!(fx.runtime.view().layout.summary_height, Some(101.0));
}

#[test]
fn thrashing_layout_publishes_at_retry_ceiling() {
    let layout = MeasuredLayout {
        blocks: Some(vec![100.0]),
        ..default_layout()
    };
    let mut fx = build(3, layout, MemorySessionStore::new(), RuntimeConfig::default());
    fx.runtime.initialize(ms(0), BootMode::Resume);

    for retry in 1..=15u64 {
        let height = if retry % 2 == 0 { 100.0 } else { 200.0 };
        fx.measurement.set_blocks(vec![height]);
        fx.runtime.fire_timers(ms(retry * 300));
        assert_eq!(fx.runtime.is_stabilizing(), retry < 15, "retry {retry}");
    }
    assert_eq!(fx.runtime.stabilized_height(), 200.0);
    let signals = fx.runtime.take_signals();
    assert!(signals.contains(&Signal::HeightPublished {
        height: 200.0,
        exhausted: true
    }));
}

#[test]
fn content_change_restarts_single_polling_loop() {
    let mut fx = started(3);
    fx.runtime.fire_timers(ms(300));
    // Ready + idle fallback + one poll.
    assert_eq!(fx.runtime.pending_timers(), 3);

    fx.runtime.dispatch(ms(400), CarouselEvent::ContentChanged);
    assert_eq!(fx.runtime.pending_timers(), 3);
    assert_eq!(fx.runtime.next_deadline(), Some(ms(700)));

    fx.runtime.dispatch(ms(450), CarouselEvent::ContentChanged);
    assert_eq!(fx.runtime.pending_timers(), 3);
    assert_eq!(fx.runtime.next_deadline(), Some(ms(750)));
}

#[test]
fn anchor_is_padded_and_not_republished_when_unchanged() {
    let layout = MeasuredLayout {
        anchor: Some(Size::new(40.2, 10.1)),
        ..default_layout()
    };
    let mut fx = build(3, layout, MemorySessionStore::new(), RuntimeConfig::default());
    fx.runtime.initialize(ms(0), BootMode::Resume);
    assert_eq!(fx.runtime.anchor_size(), Size::new(61.0, 31.0));
    fx.runtime.take_signals();

    fx.runtime.dispatch(ms(10), CarouselEvent::AnchorResized);
    fx.runtime
        .dispatch(ms(20), CarouselEvent::ViewportResized(Size::new(1280.0, 800.0)));
    let republished = fx
        .runtime
        .take_signals()
        .into_iter()
        .any(|s| matches!(s, Signal::AnchorPublished { .. }));
    assert!(!republished);
}

#[test]
fn narrow_anchor_pulls_resting_angle() {
    let mut fx = started(3);
    assert_eq!(fx.runtime.angle(), -65.0);

    fx.measurement.set_anchor(Size::new(30.0, 80.0));
    fx.runtime.dispatch(ms(10), CarouselEvent::AnchorResized);
    assert_eq!(fx.runtime.anchor_size(), Size::new(50.0, 100.0));
    let expected = -65.0 - (1.618 - 0.5) * 3.0;
    assert!((fx.runtime.angle() - expected).abs() < 1e-9);
}

#[test]
fn resize_order_does_not_change_published_sizes() {
    let layout = MeasuredLayout {
        blocks: Some(vec![200.0, 150.0]),
        anchor: Some(Size::new(100.4, 40.2)),
        container: Some(Size::new(300.0, 300.0)),
    };
    let viewport = Size::new(1280.0, 800.0);

    let mut resize_first = build(4, layout.clone(), MemorySessionStore::new(), RuntimeConfig::default());
    resize_first.runtime.initialize(ms(0), BootMode::Resume);
    resize_first
        .runtime
        .dispatch(ms(0), CarouselEvent::ViewportResized(viewport));
    settle(&mut resize_first.runtime, ms(0));

    let mut settle_first = build(4, layout, MemorySessionStore::new(), RuntimeConfig::default());
    settle_first.runtime.initialize(ms(0), BootMode::Resume);
    let now = settle(&mut settle_first.runtime, ms(0));
    settle_first
        .runtime
        .dispatch(now, CarouselEvent::ViewportResized(viewport));
    settle(&mut settle_first.runtime, now);

    let a = resize_first.runtime.view();
    let b = settle_first.runtime.view();
    assert_eq!(a.anchor, b.anchor);
    assert_eq!(a.summary_height, b.summary_height);
    assert_eq!(a.layout, b.layout);
    assert_eq!(a.anchor, Size::new(121.0, 61.0));
    assert_eq!(a.summary_height, 200.0);
}

#[test]
fn container_resize_keeps_angle_mid_sweep() {
    let mut fx = started(3);
    assert_eq!(fx.runtime.view().radius, 200.0);
    fx.runtime
        .dispatch(ms(0), CarouselEvent::TransitionStart { target: 1 });
    fx.runtime.animation_frame(ms(700));
    let angle = fx.runtime.angle();

    fx.measurement.set_container(Size::new(800.0, 800.0));
    fx.runtime.dispatch(ms(710), CarouselEvent::ContainerResized);
    let view = fx.runtime.view();
    assert_eq!(view.radius, 400.0);
    assert_eq!(view.angle, angle);
    assert_eq!(view.orbit_position, crate::motion::project(angle, 400.0));
}

#[test]
fn missing_measurements_degrade_to_no_ops() {
    let mut fx = build(
        3,
        MeasuredLayout::default(),
        MemorySessionStore::new(),
        RuntimeConfig::default(),
    );
    fx.runtime.initialize(ms(0), BootMode::Resume);
    assert!(!fx.runtime.is_stabilizing());
    assert_eq!(fx.runtime.anchor_size(), Size::ZERO);
    assert_eq!(fx.runtime.view().radius, 0.0);

    fx.measurement.set_blocks(vec![64.0]);
    fx.runtime.dispatch(ms(50), CarouselEvent::ContentChanged);
    settle(&mut fx.runtime, ms(50));
    assert_eq!(fx.runtime.stabilized_height(), 64.0);
}

#[test]
fn pointer_effects_wait_for_settle_delay() {
    let mut fx = started(3);
    fx.runtime.dispatch(ms(10), CarouselEvent::PointerEntered);
    fx.runtime
        .dispatch(ms(10), CarouselEvent::PointerMoved(Point::new(5.0, 5.0)));
    assert_eq!(fx.runtime.view().pointer, PointerState::default());

    fx.runtime.fire_timers(ms(999));
    assert!(!fx.runtime.is_ready());
    fx.runtime.fire_timers(ms(1000));
    assert!(fx.runtime.is_ready());
    assert!(fx.runtime.take_signals().contains(&Signal::Ready));

    fx.runtime.dispatch(ms(1010), CarouselEvent::PointerEntered);
    fx.runtime
        .dispatch(ms(1010), CarouselEvent::PointerMoved(Point::new(5.0, 5.0)));
    let pointer = fx.runtime.view().pointer;
    assert!(pointer.hovering);
    assert_eq!(pointer.position, Some(Point::new(5.0, 5.0)));
    fx.runtime.dispatch(ms(1020), CarouselEvent::PointerLeft);
    assert!(!fx.runtime.view().pointer.hovering);
}

#[test]
fn deferred_work_uses_idle_callback_when_available() {
    let config = RuntimeConfig {
        idle_callbacks: true,
        ..RuntimeConfig::default()
    };
    let mut fx = build(3, default_layout(), MemorySessionStore::new(), config);
    fx.runtime.initialize(ms(0), BootMode::Resume);
    fx.runtime.take_signals();
    settle(&mut fx.runtime, ms(0));
    fx.runtime.fire_timers(ms(5000));
    assert!(!fx.runtime.take_signals().contains(&Signal::DeferredWorkDue));

    fx.runtime.dispatch(ms(5100), CarouselEvent::Idle);
    fx.runtime.dispatch(ms(5200), CarouselEvent::Idle);
    let due = fx
        .runtime
        .take_signals()
        .into_iter()
        .filter(|s| *s == Signal::DeferredWorkDue)
        .count();
    assert_eq!(due, 1);
}

#[test]
fn deferred_work_falls_back_to_fixed_delay() {
    let mut fx = started(3);
    fx.runtime.fire_timers(ms(999));
    assert!(!fx.runtime.take_signals().contains(&Signal::DeferredWorkDue));
    fx.runtime.fire_timers(ms(1000));
    assert!(fx.runtime.take_signals().contains(&Signal::DeferredWorkDue));
}

#[test]
fn teardown_releases_everything() {
    let mut fx = started(3);
    fx.runtime
        .dispatch(ms(0), CarouselEvent::TransitionStart { target: 1 });
    assert!(fx.runtime.pending_timers() > 0);

    fx.runtime.teardown();
    assert_eq!(fx.runtime.pending_timers(), 0);
    assert!(fx.runtime.is_torn_down());
    assert!(!fx.runtime.is_stabilizing());
    assert!(!fx.runtime.wants_frame());
    assert!(fx.runtime.animation_frame(ms(100)).is_none());
    assert!(!fx.runtime.request_next());

    fx.runtime.take_signals();
    fx.measurement.unmount();
    fx.runtime.dispatch(ms(200), CarouselEvent::ViewportResized(Size::new(10.0, 10.0)));
    fx.runtime.fire_timers(ms(10_000));
    fx.runtime.teardown();
    assert!(fx.runtime.take_signals().is_empty());
}

#[test]
fn initialize_runs_once() {
    let mut fx = started(3);
    fx.runtime.initialize(ms(50), BootMode::FreshLoad);
    assert!(fx.runtime.take_signals().is_empty());
}

#[test]
fn request_slide_sets_direction() {
    let mut fx = started(5);
    assert!(!fx.runtime.request_slide(0));
    assert!(!fx.runtime.request_slide(5));
    assert!(fx.runtime.request_slide(3));
    assert_eq!(fx.runtime.state().direction, Direction::Forward);
}

#[test]
fn runtime_logs_lifecycle_through_logger() {
    let sink = MemorySink::new();
    let logger = Logger::new(sink.clone());
    let config = RuntimeConfig {
        logger: Some(logger.clone()),
        ..RuntimeConfig::default()
    };
    let mut fx = build(3, default_layout(), MemorySessionStore::new(), config);
    fx.runtime
        .register_plugin(diagnostics::LifecycleLoggerPlugin::new(logger));
    fx.runtime.initialize(ms(0), BootMode::Resume);

    let mut host = SimulatedHost::new(ms(2000));
    transition(&mut fx.runtime, &mut host, ms(0), CarouselRuntime::request_next);

    let runtime_messages = sink.messages("carousel::runtime");
    assert!(runtime_messages.contains(&"initialized".to_string()));
    assert!(runtime_messages.contains(&"index_committed".to_string()));
    let lifecycle = sink.messages("carousel::runtime.lifecycle");
    assert_eq!(lifecycle.first().map(String::as_str), Some("plugin_initialized"));
    assert!(lifecycle.iter().filter(|m| m.as_str() == "signal").count() > 3);
}

struct FailingPlugin;

impl CarouselPlugin for FailingPlugin {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_signal(&mut self, _view: &CarouselView, _signal: &Signal) -> Result<()> {
        Err(EngineError::Io(std::io::Error::other("boom")))
    }
}

#[test]
fn plugin_failures_are_logged_not_raised() {
    let sink = MemorySink::new();
    let config = RuntimeConfig {
        logger: Some(Logger::new(sink.clone())),
        ..RuntimeConfig::default()
    };
    let mut fx = build(3, default_layout(), MemorySessionStore::new(), config);
    fx.runtime.register_plugin(FailingPlugin);
    fx.runtime.initialize(ms(0), BootMode::Resume);
    assert!(fx.runtime.request_next());
    assert!(
        sink.messages("carousel::runtime")
            .contains(&"plugin_failed".to_string())
    );
}
