//! Terminal carousel demo.
//!
//! `cargo run --example terminal_carousel [config.json]`
//!
//! Arrow keys (or h/l) move between slides, 1-9 jump, q quits. Runtime logs
//! go to `terminal_carousel.log` in the working directory.

use std::sync::Arc;
use std::time::Duration;

use orbit_carousel::{
    CliDriver, EngineConfig, FileSink, LifecycleLoggerPlugin, Logger, MemorySessionStore,
    MetricsSnapshotPlugin, RuntimeConfig, SharedMeasurement, SlideCard, SlideSet,
    CarouselRuntime,
};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let engine = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => {
            let mut engine = EngineConfig::default();
            // Terminal cells, not pixels.
            engine.anchor.padding = 2.0;
            engine
        }
    };

    let slides = SlideSet::new([
        SlideCard::new(
            "Harbor Lights",
            "Branding / Web",
            "Identity and site for a waterfront festival: a tidal motif carried from \
             the wordmark into scroll-driven illustrations.",
        ),
        SlideCard::new(
            "Field Notes",
            "Editorial",
            "A quarterly print journal and its reading app, sharing one typographic \
             system across paper and screen.",
        ),
        SlideCard::new(
            "Kiln",
            "Product",
            "Scheduling for ceramic studios. Firing queues, shelf space and member \
             bookings in one view.",
        ),
        SlideCard::new(
            "Northbound",
            "Campaign",
            "Launch campaign for a night-train service with animated route maps.",
        ),
        SlideCard::new(
            "Tessellate",
            "Generative",
            "A pattern engine that turns a client's palette into endless tile sets \
             for packaging and signage.",
        ),
    ])?;

    let logger = Logger::new(FileSink::new("terminal_carousel.log", 1024 * 1024)?);
    let mut config = RuntimeConfig {
        engine,
        logger: Some(logger.clone()),
        ..RuntimeConfig::default()
    };
    config.enable_metrics();
    let metrics = config
        .metrics_handle()
        .ok_or("metrics handle unavailable")?;

    let measurement = SharedMeasurement::default();
    let mut runtime = CarouselRuntime::new(
        slides.len(),
        Arc::new(measurement.clone()),
        Arc::new(MemorySessionStore::new()),
        config,
    )?;
    runtime.register_plugin(LifecycleLoggerPlugin::new(logger.clone()));
    runtime.register_plugin(MetricsSnapshotPlugin::new(logger, metrics).every(256));

    CliDriver::new(runtime, slides, measurement, Duration::from_millis(2000))
        .with_frame_interval(Duration::from_millis(16))
        .run()?;
    Ok(())
}
