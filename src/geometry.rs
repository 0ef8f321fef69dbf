use serde::{Deserialize, Serialize};

/// Width/height pair in layout units (CSS pixels for a browser host,
/// character cells for the terminal driver).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size::new(0.0, 0.0);

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Round both axes up to whole units.
    pub fn ceil(self) -> Self {
        Self::new(self.width.ceil(), self.height.ceil())
    }

    pub fn pad(self, amount: f64) -> Self {
        Self::new(self.width + amount, self.height + amount)
    }

    /// Negative or NaN extents collapse to zero.
    pub fn clamped(self) -> Self {
        Self::new(non_negative(self.width), non_negative(self.height))
    }
}

/// Offset from the orbit centre.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 { 0.0 } else { value }
}
