//! Terminal rendering layer used by the CLI driver.
//!
//! The engine never draws anything itself; this module is a small, concrete
//! rendering layer that measures slide summaries as wrapped text rows and
//! paints a [`CarouselView`] into a character grid.

use std::io::Write;

use blake3::Hash;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::access::bullet_label;
use crate::error::Result;
use crate::geometry::Size;
use crate::measure::SharedMeasurement;
use crate::runtime::{CarouselView, TransitionPhase};
use crate::slides::SlideSet;

/// Demo payload for one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideCard {
    pub title: String,
    pub category: String,
    pub summary: String,
}

impl SlideCard {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            summary: summary.into(),
        }
    }
}

const ANCHOR_LABEL: &str = "[ view details ]";
const ORBIT_ROWS: u16 = 9;

/// Visible width of `text` once ANSI escapes are removed.
pub fn display_width(text: &str) -> usize {
    let stripped = strip_ansi_escapes::strip_str(text);
    UnicodeWidthStr::width(stripped.as_str())
}

/// Greedy word wrap to `width` columns. Words wider than a line are split.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width = display_width(word);
        if line_width > 0 && line_width + 1 + word_width <= width {
            line.push(' ');
            line.push_str(word);
            line_width += 1 + word_width;
            continue;
        }
        if line_width > 0 {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }
        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if line_width + ch_width > width && line_width > 0 {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(ch);
            line_width += ch_width;
        }
    }

    if line_width > 0 {
        lines.push(line);
    }
    lines
}

/// Terminal-backed measurement source. Every resize republishes block
/// heights (wrapped summary rows), the anchor box and the orbit container.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    cols: u16,
    rows: u16,
    summaries: Vec<String>,
    measurement: SharedMeasurement,
}

impl TerminalSurface {
    pub fn new(slides: &SlideSet<SlideCard>, measurement: SharedMeasurement) -> Self {
        Self {
            cols: 0,
            rows: 0,
            summaries: slides
                .iter()
                .map(|slide| slide.content.summary.clone())
                .collect(),
            measurement,
        }
    }

    pub fn summary_columns(&self) -> usize {
        usize::from(self.cols / 2).max(12)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> Size {
        self.cols = cols;
        self.rows = rows;
        self.publish();
        Size::new(f64::from(cols), f64::from(rows))
    }

    fn publish(&self) {
        let columns = self.summary_columns();
        let heights: Vec<f64> = self
            .summaries
            .iter()
            .map(|summary| wrap_lines(summary, columns).len() as f64)
            .collect();
        let orbit_cols = (ORBIT_ROWS * 4).min(self.cols);
        self.measurement.update(|layout| {
            layout.blocks = Some(heights);
            layout.anchor = Some(Size::new(display_width(ANCHOR_LABEL) as f64, 1.0));
            layout.container = Some(Size::new(f64::from(orbit_cols), f64::from(ORBIT_ROWS)));
        });
    }
}

/// Paint `view` as plain text lines.
pub fn compose_frame(view: &CarouselView, slides: &SlideSet<SlideCard>, cols: u16) -> String {
    let columns = usize::from(cols / 2).max(12);
    let mut out = Vec::new();
    let active = view.state.active_index;

    out.push(format!(
        "WORKS  {} / {:02}{}",
        bullet_label(active).number,
        view.slide_count,
        match view.state.phase {
            TransitionPhase::Idle => String::new(),
            TransitionPhase::Transitioning { target } => {
                format!("  -> {}", bullet_label(target).number)
            }
        }
    ));
    out.push(String::new());

    if let Some(slide) = slides.get(active) {
        out.push(slide.content.title.clone());
        out.push(format!("  {}", slide.content.category));
        let summary = wrap_lines(&slide.content.summary, columns);
        let reserved = view.summary_height.max(summary.len() as f64) as usize;
        for row in 0..reserved {
            out.push(summary.get(row).cloned().unwrap_or_default());
        }
    }
    out.push(String::new());
    out.push(ANCHOR_LABEL.to_string());
    out.push(String::new());
    out.extend(orbit_rows(view));
    out.push(String::new());

    let bullets: Vec<String> = (0..view.slide_count)
        .map(|index| {
            let label = bullet_label(index).number;
            if index == active {
                format!("({label})")
            } else {
                format!(" {label} ")
            }
        })
        .collect();
    out.push(bullets.join(""));
    out.push(format!(
        "angle {:>8.2}  {}  {}",
        view.angle,
        if view.ready { "ready" } else { "settling" },
        "<- / -> move, 1-9 jump, q quits"
    ));
    out.join("\n")
}

/// Whether the cell at `column`, `row` of a composed `frame` lies on the
/// anchor label.
pub fn anchor_hit(frame: &str, column: u16, row: u16) -> bool {
    frame
        .lines()
        .nth(usize::from(row))
        .is_some_and(|line| line == ANCHOR_LABEL && usize::from(column) < display_width(line))
}

fn orbit_rows(view: &CarouselView) -> Vec<String> {
    let rows = usize::from(ORBIT_ROWS);
    let cols = rows * 4;
    let mut grid = vec![vec![' '; cols]; rows];
    let (cy, cx) = ((rows / 2) as f64, (cols / 2) as f64);
    let ry = (rows / 2) as f64;
    let rx = ry * 2.0;

    let mut plot = |deg: f64, glyph: char| {
        let rad = deg.to_radians();
        let x = (cx + rad.cos() * rx).round() as usize;
        let y = (cy + rad.sin() * ry).round() as usize;
        if let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = glyph;
        }
    };
    for step in 0..24 {
        plot(f64::from(step) * 15.0, '.');
    }
    let marker = if view.orbit_active { '@' } else { 'o' };
    if view.radius > 0.0 {
        plot(view.angle, marker);
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

/// Writes frames to a terminal, skipping frames identical to the last one.
#[derive(Debug, Default)]
pub struct FrameRenderer {
    last: Option<Hash>,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether anything was written.
    pub fn draw(&mut self, out: &mut impl Write, frame: &str) -> Result<bool> {
        let hash = blake3::hash(frame.as_bytes());
        if self.last == Some(hash) {
            return Ok(false);
        }

        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        for (row, line) in frame.lines().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(out, MoveTo(0, row), Print(line))?;
        }
        out.flush()?;
        self.last = Some(hash);
        Ok(true)
    }

    /// Force the next frame to be written.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
