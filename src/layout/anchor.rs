use crate::config::AnchorConfig;
use crate::geometry::Size;

/// Derives the padded size of the reference element.
///
/// Recomputes are idempotent: [`AnchorSizer::observe`] only reports a value
/// when the derived size actually moved, so repeated triggers with unchanged
/// inputs never cause a republish.
#[derive(Debug, Clone)]
pub struct AnchorSizer {
    padding: f64,
    size: Size,
}

impl AnchorSizer {
    pub fn new(config: &AnchorConfig) -> Self {
        Self {
            padding: config.padding,
            size: Size::ZERO,
        }
    }

    /// `ceil(raw) + padding` on both axes.
    pub fn derive(&self, raw: Size) -> Size {
        raw.clamped().ceil().pad(self.padding)
    }

    /// Feed a fresh bounding box. `None` (element not mounted) is a no-op.
    pub fn observe(&mut self, raw: Option<Size>) -> Option<Size> {
        let next = self.derive(raw?);
        if next == self.size {
            return None;
        }
        self.size = next;
        Some(next)
    }

    /// Current published size; zero until the first observation.
    pub fn size(&self) -> Size {
        self.size
    }
}
