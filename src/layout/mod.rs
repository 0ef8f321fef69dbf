//! Layout measurement pipeline: height stabilization, anchor sizing and the
//! variables derived from both.

mod anchor;
pub mod stabilizer;
mod vars;

pub use anchor::AnchorSizer;
pub use stabilizer::{HeightStabilizer, SampleOutcome, Stabilized};
pub use vars::{AnchorOutline, LayoutVars};
