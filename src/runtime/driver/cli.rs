use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;

use crate::geometry::Point;
use crate::measure::SharedMeasurement;
use crate::render::{FrameRenderer, SlideCard, TerminalSurface, anchor_hit, compose_frame};
use crate::runtime::{BootMode, CarouselEvent, CarouselRuntime};
use crate::slides::SlideSet;
use crate::EngineError;

use super::SimulatedHost;

pub type DriverResult<T> = std::result::Result<T, CliDriverError>;

#[derive(Debug, Error)]
pub enum CliDriverError {
    #[error("runtime error: {0}")]
    Runtime(#[from] EngineError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Runs a carousel in the terminal: raw mode, alternate screen, arrow keys
/// for navigation. The driver stands in for the rendering layer, so it
/// emits the transition lifecycle and measures the text it draws.
pub struct CliDriver {
    runtime: CarouselRuntime,
    slides: SlideSet<SlideCard>,
    surface: TerminalSurface,
    host: SimulatedHost,
    renderer: FrameRenderer,
    frame_interval: Duration,
    cols: u16,
    last_frame: String,
    hover: HoverTracker,
}

/// Turns per-move hit tests into enter/leave edges.
#[derive(Debug, Default)]
struct HoverTracker {
    inside: bool,
}

impl HoverTracker {
    fn update(&mut self, inside: bool) -> Option<CarouselEvent> {
        if inside == self.inside {
            return None;
        }
        self.inside = inside;
        Some(if inside {
            CarouselEvent::PointerEntered
        } else {
            CarouselEvent::PointerLeft
        })
    }
}

impl CliDriver {
    /// `measurement` must be the same surface the runtime was built with.
    pub fn new(
        runtime: CarouselRuntime,
        slides: SlideSet<SlideCard>,
        measurement: SharedMeasurement,
        transition_speed: Duration,
    ) -> Self {
        let surface = TerminalSurface::new(&slides, measurement);
        Self {
            runtime,
            slides,
            surface,
            host: SimulatedHost::new(transition_speed),
            renderer: FrameRenderer::new(),
            frame_interval: Duration::from_millis(16),
            cols: 0,
            last_frame: String::new(),
            hover: HoverTracker::default(),
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn run(mut self) -> DriverResult<()> {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner(&mut stdout);
        self.runtime.teardown();
        self.exit(&mut stdout);
        result
    }

    fn run_inner(&mut self, stdout: &mut impl Write) -> DriverResult<()> {
        let clock = Instant::now();
        let (width, height) = terminal::size()?;
        self.resize(clock.elapsed(), width, height);
        self.runtime.initialize(clock.elapsed(), BootMode::Resume);

        loop {
            if event::poll(self.frame_interval)? {
                let now = clock.elapsed();
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Right | KeyCode::Char('l') => {
                            self.runtime.request_next();
                        }
                        KeyCode::Left | KeyCode::Char('h') => {
                            self.runtime.request_prev();
                        }
                        KeyCode::Char(digit @ '1'..='9') => {
                            let index = digit as usize - '1' as usize;
                            self.runtime.request_slide(index);
                        }
                        _ => {}
                    },
                    Event::Mouse(mouse) if mouse.kind == MouseEventKind::Moved => {
                        let at = Point::new(f64::from(mouse.column), f64::from(mouse.row));
                        self.runtime.dispatch(now, CarouselEvent::PointerMoved(at));
                        let inside = anchor_hit(&self.last_frame, mouse.column, mouse.row);
                        if let Some(edge) = self.hover.update(inside) {
                            self.runtime.dispatch(now, edge);
                        }
                    }
                    Event::Resize(width, height) => self.resize(now, width, height),
                    _ => {}
                }
            }

            let now = clock.elapsed();
            self.host.pump(&mut self.runtime, now);
            let frame = compose_frame(&self.runtime.view(), &self.slides, self.cols);
            self.renderer.draw(stdout, &frame)?;
            self.last_frame = frame;
        }
        Ok(())
    }

    fn resize(&mut self, now: Duration, width: u16, height: u16) {
        self.cols = width;
        let viewport = self.surface.resize(width, height);
        self.renderer.invalidate();
        self.runtime
            .dispatch(now, CarouselEvent::ViewportResized(viewport));
        self.runtime.dispatch(now, CarouselEvent::ContainerResized);
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| CliDriverError::Terminal(err.to_string()))?;
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, Show, DisableMouseCapture, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}
