use std::f64::consts::PI;

use serde::Serialize;

use crate::geometry::Size;

/// Layout variables handed to the rendering layer. A field is `None` while
/// the input it derives from is still zero, so the renderer keeps its own
/// fallback styling until real measurements arrive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LayoutVars {
    pub anchor_height: Option<f64>,
    pub anchor_half_width: Option<f64>,
    pub summary_height: Option<f64>,
    pub summary_width: Option<f64>,
    pub outline: Option<AnchorOutline>,
}

/// Pill-shaped outline traced around the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchorOutline {
    pub corner_radius: f64,
    /// Perimeter used as the stroke dash length.
    pub stroke_length: f64,
}

impl AnchorOutline {
    pub fn for_size(size: Size) -> Self {
        let radius = size.width.min(size.height) / 2.0;
        let straight = size.width + size.height - 2.0 * radius;
        Self {
            corner_radius: radius,
            stroke_length: (straight + 2.0 * PI * radius).ceil(),
        }
    }
}

impl LayoutVars {
    pub fn derive(anchor: Size, summary_height: f64, viewport: Size) -> Self {
        let half_anchor = (anchor.width / 2.0).ceil();
        Self {
            anchor_height: positive(anchor.height),
            anchor_half_width: positive(anchor.width).map(|_| half_anchor),
            summary_height: positive(summary_height),
            summary_width: positive(viewport.width)
                .map(|width| (width / 2.0).ceil() - half_anchor),
            outline: (anchor.width > 0.0 && anchor.height > 0.0)
                .then(|| AnchorOutline::for_size(anchor)),
        }
    }
}

fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}
