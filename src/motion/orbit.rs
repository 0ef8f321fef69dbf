use std::time::Duration;

use crate::config::OrbitConfig;
use crate::geometry::{Point, Size, non_negative};

/// Identifies one sweep; frames for a finished or cancelled sweep are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweepHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Sweep {
    handle: SweepHandle,
    start_deg: f64,
    target_deg: f64,
    started_at: Duration,
}

/// Outcome of advancing the animator by one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitFrame {
    pub angle: f64,
    pub position: Point,
    /// Set on the frame that completed the sweep.
    pub finished: bool,
}

/// Point travelling on a circle whose radius is half the container width.
///
/// At most one sweep owns the angle at a time; start requests that arrive
/// while a sweep is in flight are rejected rather than queued.
#[derive(Debug, Clone)]
pub struct OrbitalAnimator {
    config: OrbitConfig,
    angle: f64,
    radius: f64,
    sweep: Option<Sweep>,
    deferred_rest: Option<f64>,
    next_handle: u64,
}

impl OrbitalAnimator {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            angle: config.initial_deg,
            config,
            radius: 0.0,
            sweep: None,
            deferred_rest: None,
            next_handle: 0,
        }
    }

    /// Resting angle for an anchor of the given size.
    ///
    /// Anchors much narrower than the golden ratio pull the marker further
    /// round (towards `min_deg`) so it does not collide with the anchor.
    pub fn resting_angle(&self, anchor: Size) -> f64 {
        let OrbitConfig {
            initial_deg,
            golden_ratio,
            ratio_scale,
            min_deg,
            max_deg,
            ..
        } = self.config;

        if anchor.height <= 0.0 {
            return initial_deg;
        }
        let diff = golden_ratio - anchor.width / anchor.height;
        if diff <= 1.0 {
            return initial_deg;
        }
        let raw = initial_deg - diff * ratio_scale;
        // Configs built in code skip validation; order the bounds here.
        let (lo, hi) = (min_deg.min(max_deg), min_deg.max(max_deg));
        if lo <= hi { raw.clamp(lo, hi) } else { raw }
    }

    /// Move to the resting angle for `anchor`. While a sweep is in flight the
    /// new resting angle is applied once that sweep completes.
    pub fn rest_for_anchor(&mut self, anchor: Size) -> f64 {
        let rest = self.resting_angle(anchor);
        if self.sweep.is_some() {
            self.deferred_rest = Some(rest);
        } else {
            self.angle = rest;
        }
        rest
    }

    /// Recompute the radius from the container and re-project the current
    /// angle onto it. `None` leaves the radius untouched.
    pub fn resize(&mut self, container: Option<Size>) -> Point {
        if let Some(container) = container {
            self.radius = non_negative(container.width) / 2.0;
        }
        self.position()
    }

    /// Begin a full sweep at `now`. Returns `None` when a sweep is already
    /// running; the in-flight sweep is left untouched.
    pub fn start_sweep(&mut self, now: Duration) -> Option<SweepHandle> {
        if self.sweep.is_some() {
            return None;
        }
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = SweepHandle(self.next_handle);
        self.sweep = Some(Sweep {
            handle,
            start_deg: self.angle,
            target_deg: self.angle - self.config.sweep_deg,
            started_at: now,
        });
        Some(handle)
    }

    /// Advance the in-flight sweep using elapsed wall-clock time, so the
    /// total duration does not depend on the frame rate. Without a sweep this
    /// reports the resting position.
    pub fn frame(&mut self, now: Duration) -> OrbitFrame {
        let Some(sweep) = self.sweep else {
            return OrbitFrame {
                angle: self.angle,
                position: self.position(),
                finished: false,
            };
        };

        let duration = self.config.sweep_duration().as_secs_f64();
        let elapsed = now.saturating_sub(sweep.started_at).as_secs_f64();
        let progress = if duration <= 0.0 {
            1.0
        } else {
            (elapsed / duration).min(1.0)
        };

        let finished = progress >= 1.0;
        if finished {
            self.angle = sweep.target_deg % 360.0;
            self.sweep = None;
            if let Some(rest) = self.deferred_rest.take() {
                self.angle = rest;
            }
        } else {
            self.angle = sweep.start_deg + (sweep.target_deg - sweep.start_deg) * progress;
        }

        OrbitFrame {
            angle: self.angle,
            position: self.position(),
            finished,
        }
    }

    /// Abandon the in-flight sweep, leaving the angle where the last frame put it.
    pub fn cancel(&mut self) {
        self.sweep = None;
        self.deferred_rest = None;
    }

    pub fn is_animating(&self) -> bool {
        self.sweep.is_some()
    }

    pub fn active_sweep(&self) -> Option<SweepHandle> {
        self.sweep.map(|sweep| sweep.handle)
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self) -> Point {
        project(self.angle, self.radius)
    }
}

/// Screen offset of `deg` on a circle of `radius`.
pub fn project(deg: f64, radius: f64) -> Point {
    let rad = deg.to_radians();
    Point::new(radius * rad.cos(), radius * rad.sin())
}
