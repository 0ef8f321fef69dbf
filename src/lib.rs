//! Motion and layout synchronization engine for a looping slide carousel.
//!
//! The engine does not draw. A rendering layer feeds it lifecycle events,
//! measurements and timestamps; it answers with the active index, the orbit
//! marker geometry, stabilized layout sizes and per-slide accessibility flags.
//! All core algorithms are pure so they can be exercised without a real
//! rendering surface.

pub mod access;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod measure;
pub mod metrics;
pub mod motion;
pub mod persistence;
pub mod render;
pub mod runtime;
pub mod slides;

pub use access::{AccessibilityFlags, AccessibilityGate, BulletLabel, GatePhase, bullet_label};
pub use config::{AnchorConfig, ControllerConfig, EngineConfig, OrbitConfig, StabilizerConfig};
pub use error::{EngineError, Result};
pub use geometry::{Point, Size};
pub use layout::{AnchorOutline, AnchorSizer, HeightStabilizer, LayoutVars, SampleOutcome, Stabilized};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use measure::{MeasuredLayout, Measurement, SharedMeasurement};
pub use metrics::{EngineMetrics, MetricSnapshot};
pub use motion::{OrbitFrame, OrbitalAnimator, SweepHandle};
pub use persistence::{
    MemorySessionStore, SLIDE_INDEX_KEY, SessionStore, SlideIndexStore, parse_slide_index,
};
pub use render::{FrameRenderer, SlideCard, TerminalSurface, display_width};
pub use runtime::diagnostics::{LifecycleLoggerPlugin, MetricsSnapshotPlugin};
pub use runtime::driver::SimulatedHost;
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::{
    BootMode, CarouselEvent, CarouselPlugin, CarouselRuntime, CarouselState, CarouselView,
    Direction, PointerState, RuntimeConfig, Signal, TransitionPhase,
};
pub use slides::{Slide, SlideSet};
