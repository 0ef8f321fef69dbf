//! Measurement port supplied by the rendering layer.
//!
//! Every query returns `None` while the underlying element is unmounted or
//! unready; callers treat that as a no-op for the current cycle.

use std::sync::{Arc, RwLock};

use crate::geometry::Size;

pub trait Measurement: Send + Sync {
    /// Raw rendered heights of the blocks the stabilizer tracks.
    fn block_heights(&self) -> Option<Vec<f64>>;

    /// Bounding box of the reference interactive element.
    fn anchor_box(&self) -> Option<Size>;

    /// Bounding box of the element the orbit is drawn inside.
    fn orbit_container(&self) -> Option<Size>;
}

/// Plain snapshot of everything a [`Measurement`] can answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasuredLayout {
    pub blocks: Option<Vec<f64>>,
    pub anchor: Option<Size>,
    pub container: Option<Size>,
}

/// Shared, mutable measurement surface. The host (or a test) keeps one clone
/// and updates it as the rendered tree changes.
#[derive(Debug, Clone, Default)]
pub struct SharedMeasurement {
    inner: Arc<RwLock<MeasuredLayout>>,
}

impl SharedMeasurement {
    pub fn new(layout: MeasuredLayout) -> Self {
        Self {
            inner: Arc::new(RwLock::new(layout)),
        }
    }

    pub fn update(&self, apply: impl FnOnce(&mut MeasuredLayout)) {
        if let Ok(mut guard) = self.inner.write() {
            apply(&mut *guard);
        }
    }

    pub fn set_blocks(&self, heights: impl Into<Vec<f64>>) {
        let heights = heights.into();
        self.update(|layout| layout.blocks = Some(heights));
    }

    pub fn set_anchor(&self, size: Size) {
        self.update(|layout| layout.anchor = Some(size));
    }

    pub fn set_container(&self, size: Size) {
        self.update(|layout| layout.container = Some(size));
    }

    /// Simulate the measured tree going away.
    pub fn unmount(&self) {
        self.update(|layout| *layout = MeasuredLayout::default());
    }

    fn read<T>(&self, pick: impl FnOnce(&MeasuredLayout) -> Option<T>) -> Option<T> {
        self.inner.read().ok().and_then(|guard| pick(&*guard))
    }
}

impl Measurement for SharedMeasurement {
    fn block_heights(&self) -> Option<Vec<f64>> {
        self.read(|layout| layout.blocks.clone())
    }

    fn anchor_box(&self) -> Option<Size> {
        self.read(|layout| layout.anchor)
    }

    fn orbit_container(&self) -> Option<Size> {
        self.read(|layout| layout.container)
    }
}
