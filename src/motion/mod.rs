//! Orbital indicator motion tied to slide transitions.

mod orbit;

pub use orbit::{OrbitFrame, OrbitalAnimator, SweepHandle, project};
