//! Convergence detection for the tallest of a set of content blocks.
//!
//! Images and web fonts keep reflowing content for a while after mount, so a
//! single measurement is not trustworthy. The stabilizer is sampled on a fixed
//! interval until the maximum height stops moving or the retry ceiling is hit.
//! Scheduling is left to the caller: every [`SampleOutcome::Retry`] names the
//! delay and the run generation the next sample must carry.

use std::time::Duration;

use crate::config::StabilizerConfig;
use crate::geometry::non_negative;

/// Result of feeding one sample into the stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// The sample belonged to a cancelled or superseded run and was ignored.
    Stale,
    /// Not settled yet; sample again after `delay` with the same generation.
    Retry { generation: u64, delay: Duration },
    Published(Stabilized),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stabilized {
    pub height: f64,
    pub samples: usize,
    pub retries: u32,
    /// True when the retry ceiling ended the run instead of convergence.
    pub exhausted: bool,
    /// True when `height` differs from the previously published value.
    pub changed: bool,
}

#[derive(Debug, Clone, Default)]
struct ConvergenceRun {
    last_height: f64,
    peak: f64,
    stable_count: u32,
    retries: u32,
    history: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HeightStabilizer {
    config: StabilizerConfig,
    generation: u64,
    run: Option<ConvergenceRun>,
    published: f64,
    settled: bool,
}

impl HeightStabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            generation: 0,
            run: None,
            published: 0.0,
            settled: false,
        }
    }

    /// Start a fresh run, superseding any run still in flight. The returned
    /// generation must accompany every sample of the new run.
    pub fn arm(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.run = Some(ConvergenceRun::default());
        self.settled = false;
        self.generation
    }

    /// Drop the in-flight run; pending samples become stale.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.run = None;
    }

    pub fn sample(&mut self, generation: u64, raw_heights: &[f64]) -> SampleOutcome {
        if generation != self.generation {
            return SampleOutcome::Stale;
        }
        let Some(run) = self.run.as_mut() else {
            return SampleOutcome::Stale;
        };

        let max = raw_heights
            .iter()
            .map(|height| non_negative(*height).ceil())
            .fold(0.0, f64::max);
        run.history.push(max);

        if raw_heights.is_empty() {
            return SampleOutcome::Published(self.finish(false));
        }

        if (max - run.last_height).abs() < self.config.tolerance {
            run.stable_count += 1;
            run.peak = run.peak.max(max);
        } else {
            run.stable_count = 0;
            run.last_height = max;
            run.peak = max;
        }

        if run.stable_count >= self.config.required_stable {
            return SampleOutcome::Published(self.finish(false));
        }
        if run.retries >= self.config.max_retries {
            return SampleOutcome::Published(self.finish(true));
        }

        run.retries += 1;
        SampleOutcome::Retry {
            generation,
            delay: self.config.interval(),
        }
    }

    fn finish(&mut self, exhausted: bool) -> Stabilized {
        let run = self.run.take().unwrap_or_default();
        let changed = run.peak != self.published;
        self.published = run.peak;
        self.settled = true;
        Stabilized {
            height: run.peak,
            samples: run.history.len(),
            retries: run.retries,
            exhausted,
            changed,
        }
    }

    /// Last published height; zero until the first run settles.
    pub fn height(&self) -> f64 {
        self.published
    }

    /// False while a run is pending or after content was invalidated.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn is_polling(&self) -> bool {
        self.run.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Maxima sampled by the in-flight run.
    pub fn history(&self) -> &[f64] {
        self.run.as_ref().map(|run| run.history.as_slice()).unwrap_or(&[])
    }
}
