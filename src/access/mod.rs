//! Per-slide interaction gating.
//!
//! Only the active slide may take keyboard focus or be reached by assistive
//! technology; every other slide is inert. The "current" marker is only moved
//! once a transition has settled.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccessibilityFlags {
    /// Reachable by sequential keyboard navigation.
    pub focusable: bool,
    /// Exposed to the accessibility tree.
    pub assistive_visible: bool,
    /// Carries the "current item" marker.
    pub current: bool,
}

impl AccessibilityFlags {
    pub fn is_inert(&self) -> bool {
        !self.focusable && !self.assistive_visible
    }
}

/// Point in the transition lifecycle at which the gate is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePhase {
    Initialized,
    TransitionStart,
    TransitionEnd,
}

/// Interaction flags for slide `index` when `active` is the live slide.
pub fn flags_for(index: usize, active: usize) -> AccessibilityFlags {
    let live = index == active;
    AccessibilityFlags {
        focusable: live,
        assistive_visible: live,
        current: false,
    }
}

#[derive(Debug, Clone)]
pub struct AccessibilityGate {
    flags: Vec<AccessibilityFlags>,
}

impl AccessibilityGate {
    pub fn new(slide_count: usize) -> Self {
        Self {
            flags: vec![AccessibilityFlags::default(); slide_count],
        }
    }

    /// Re-derive every slide's flags for `active`. Out-of-range indices are
    /// ignored and the previous flags stay in place.
    pub fn apply(&mut self, active: usize, phase: GatePhase) -> &[AccessibilityFlags] {
        if active >= self.flags.len() {
            return &self.flags;
        }

        for (index, slot) in self.flags.iter_mut().enumerate() {
            let current = match phase {
                GatePhase::TransitionEnd => index == active,
                GatePhase::Initialized | GatePhase::TransitionStart => slot.current,
            };
            *slot = AccessibilityFlags {
                current,
                ..flags_for(index, active)
            };
        }
        &self.flags
    }

    pub fn flags(&self) -> &[AccessibilityFlags] {
        &self.flags
    }

    pub fn focusable_slides(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, flags)| flags.focusable)
            .map(|(index, _)| index)
    }
}

/// Text for one pagination bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulletLabel {
    /// Two-digit, 1-based slide number.
    pub number: String,
    pub aria_label: String,
}

pub fn bullet_label(index: usize) -> BulletLabel {
    let number = index + 1;
    BulletLabel {
        number: format!("{number:02}"),
        aria_label: format!("Show slide {number}"),
    }
}
