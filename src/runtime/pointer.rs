use serde::Serialize;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PointerState {
    pub enabled: bool,
    /// Last pointer position seen while enabled.
    pub position: Option<Point>,
    /// Pointer is over an interactive slide target.
    pub hovering: bool,
}

/// Cursor follower that only reacts once the carousel has settled.
#[derive(Debug, Clone, Default)]
pub struct PointerFollower {
    state: PointerState,
}

impl PointerFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self) {
        self.state.enabled = true;
    }

    pub fn disable(&mut self) {
        self.state = PointerState::default();
    }

    /// Returns true when the follower moved.
    pub fn moved(&mut self, to: Point) -> bool {
        if !self.state.enabled || self.state.position == Some(to) {
            return false;
        }
        self.state.position = Some(to);
        true
    }

    pub fn set_hover(&mut self, hovering: bool) -> bool {
        if !self.state.enabled || self.state.hovering == hovering {
            return false;
        }
        self.state.hovering = hovering;
        true
    }

    pub fn state(&self) -> PointerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_input_until_enabled() {
        let mut follower = PointerFollower::new();
        assert!(!follower.moved(Point::new(3.0, 4.0)));
        assert!(!follower.set_hover(true));
        assert_eq!(follower.state(), PointerState::default());

        follower.enable();
        assert!(follower.moved(Point::new(3.0, 4.0)));
        assert!(!follower.moved(Point::new(3.0, 4.0)));
        assert!(follower.set_hover(true));
        assert!(follower.state().hovering);
    }

    #[test]
    fn disable_resets_state() {
        let mut follower = PointerFollower::new();
        follower.enable();
        follower.set_hover(true);
        follower.disable();
        assert!(!follower.state().enabled);
        assert!(!follower.state().hovering);
    }
}
