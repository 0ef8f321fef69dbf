//! Host-side drivers.
//!
//! [`SimulatedHost`] plays the rendering layer's half of the transition
//! contract and is shared by the terminal driver, the bench and the tests.

use std::time::Duration;

use super::{CarouselEvent, CarouselRuntime, Signal};

pub mod cli;

/// Answers accepted transition requests the way a slide renderer would:
/// transition-start right away, transition-end once `speed` has elapsed.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    speed: Duration,
    in_flight: Option<(Duration, usize)>,
}

impl SimulatedHost {
    pub fn new(speed: Duration) -> Self {
        Self {
            speed,
            in_flight: None,
        }
    }

    /// One host cycle at `now`: react to new signals, finish a due
    /// transition, fire timers and advance the orbit. Returns every signal
    /// observed during the cycle.
    pub fn pump(&mut self, runtime: &mut CarouselRuntime, now: Duration) -> Vec<Signal> {
        let mut seen = Vec::new();
        self.react(runtime, now, &mut seen);

        if let Some((due, target)) = self.in_flight {
            if now >= due {
                self.in_flight = None;
                runtime.dispatch(now, CarouselEvent::TransitionEnd { resolved: target });
            }
        }
        runtime.fire_timers(now);
        runtime.animation_frame(now);
        self.react(runtime, now, &mut seen);
        seen
    }

    fn react(&mut self, runtime: &mut CarouselRuntime, now: Duration, seen: &mut Vec<Signal>) {
        loop {
            let signals = runtime.take_signals();
            if signals.is_empty() {
                return;
            }
            for signal in &signals {
                if let Signal::TransitionRequested { target, .. } = signal {
                    runtime.dispatch(now, CarouselEvent::TransitionStart { target: *target });
                    self.in_flight = Some((now + self.speed, *target));
                }
            }
            seen.extend(signals);
        }
    }

    /// Target of the transition currently on screen.
    pub fn in_flight(&self) -> Option<usize> {
        self.in_flight.map(|(_, target)| target)
    }
}
