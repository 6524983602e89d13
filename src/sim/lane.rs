//! Lane and slot geometry
//!
//! The orbit is a set of concentric circular lanes crossed by 16 angular
//! slots. Gameplay logic only ever talks about (slot, lane) pairs; radii are
//! derived from the viewport and recomputed on resize without touching the
//! logical lane a runner or hazard sits in.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::{DeviceClass, Tuning};

/// A circular lane, ordered from the center outward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Inner,
    Middle,
    Outer,
}

const TWO_LANES: [Lane; 2] = [Lane::Inner, Lane::Outer];
const THREE_LANES: [Lane; 3] = [Lane::Inner, Lane::Middle, Lane::Outer];

/// Which lanes exist in this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneLayout {
    /// Inner and outer only
    Two,
    /// Inner, middle and outer
    Three,
}

impl LaneLayout {
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            2 => Some(LaneLayout::Two),
            3 => Some(LaneLayout::Three),
            _ => None,
        }
    }

    pub fn count(&self) -> usize {
        self.lanes().len()
    }

    /// Lanes from inner to outer
    pub fn lanes(&self) -> &'static [Lane] {
        match self {
            LaneLayout::Two => &TWO_LANES,
            LaneLayout::Three => &THREE_LANES,
        }
    }

    /// Position of a lane in `lanes()`, if it exists in this layout
    pub fn index_of(&self, lane: Lane) -> Option<usize> {
        self.lanes().iter().position(|&l| l == lane)
    }

    pub fn lane_at(&self, index: usize) -> Option<Lane> {
        self.lanes().get(index).copied()
    }

    pub fn outermost(&self) -> Lane {
        Lane::Outer
    }

    /// One step toward the outside, or None at the edge
    pub fn outward(&self, lane: Lane) -> Option<Lane> {
        self.index_of(lane).and_then(|i| self.lane_at(i + 1))
    }

    /// One step toward the center, or None at the edge
    pub fn inward(&self, lane: Lane) -> Option<Lane> {
        self.index_of(lane)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.lane_at(i))
    }

    /// Same lane or one step apart
    pub fn reachable(&self, from: Lane, to: Lane) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => a.abs_diff(b) <= 1,
            _ => false,
        }
    }
}

/// One of the 16 discrete angular positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot(u8);

impl Slot {
    /// Slot by index, wrapping past the last slot
    pub fn new(index: usize) -> Self {
        Self((index % SLOT_COUNT) as u8)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Angle of this slot in degrees, in [0, 360)
    pub fn angle(&self) -> f32 {
        self.0 as f32 * SLOT_SPACING_DEG
    }

    /// Slot whose angle is closest to `degrees`
    pub fn nearest(degrees: f32) -> Self {
        let steps = (crate::wrap_degrees(degrees) / SLOT_SPACING_DEG).round() as usize;
        Self::new(steps)
    }

    pub fn next(&self) -> Self {
        Self::new(self.index() + 1)
    }

    /// All slots in angular order
    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT).map(Slot::new)
    }
}

/// Lane radii for the current play field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneGeometry {
    pub layout: LaneLayout,
    pub inner_radius: f32,
    pub middle_radius: f32,
    pub outer_radius: f32,
    /// Radial tolerance for "same lane" at the moment of passing
    pub collision_margin: f32,
}

impl LaneGeometry {
    /// Fit the orbit into a play field
    pub fn for_viewport(width: f32, height: f32, device: DeviceClass, tuning: &Tuning) -> Self {
        let layout = LaneLayout::from_count(tuning.lane_count).unwrap_or(LaneLayout::Three);
        let base_size = width.min(height).max(0.0) * tuning.viewport_fraction(device);
        Self::from_outer_radius(base_size / 2.0, layout, tuning.inner_lane_fraction)
            .with_margin_fraction(tuning.collision_margin_fraction)
    }

    /// Replace the default margin with `fraction` of the inner-to-middle spacing
    pub fn with_margin_fraction(mut self, fraction: f32) -> Self {
        self.collision_margin = (self.middle_radius - self.inner_radius) * fraction;
        self
    }

    pub fn from_outer_radius(outer_radius: f32, layout: LaneLayout, inner_fraction: f32) -> Self {
        let inner_radius = outer_radius * inner_fraction;
        let middle_radius = (outer_radius + inner_radius) / 2.0;
        let lane_spacing = (outer_radius - inner_radius) / 2.0;
        Self {
            layout,
            inner_radius,
            middle_radius,
            outer_radius,
            collision_margin: lane_spacing * COLLISION_MARGIN_FRACTION,
        }
    }

    /// Centerline radius of a lane
    #[inline]
    pub fn radius(&self, lane: Lane) -> f32 {
        match lane {
            Lane::Inner => self.inner_radius,
            Lane::Middle => self.middle_radius,
            Lane::Outer => self.outer_radius,
        }
    }

    /// Whether a radial position counts as occupying `lane`
    #[inline]
    pub fn within_margin(&self, radius: f32, lane: Lane) -> bool {
        (radius - self.radius(lane)).abs() < self.collision_margin
    }

    /// Radii of the lanes that exist, inner to outer
    pub fn radii(&self) -> Vec<f32> {
        self.layout.lanes().iter().map(|&l| self.radius(l)).collect()
    }
}
