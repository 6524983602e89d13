//! Collision detection between the runner and slot-placed objects
//!
//! The runner moves continuously while hazards sit on discrete slots, so a
//! hit is decided the first tick the runner's angle reaches a slot: the
//! angular test says "we are at it now", then the radial test says "and in
//! its lane". The window grows with speed so a long, fast tick cannot step
//! clean over a slot.

use super::lane::{Lane, LaneGeometry, Slot};
use crate::consts::REACH_LEAD_DEG;
use crate::normalize_degrees;
use crate::tuning::Tuning;

/// Result of testing the runner against one placed object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Runner has not reached the slot (or is far past it)
    NotReached,
    /// Runner is at the slot and inside the object's lane band
    Hit,
    /// Runner is at the slot in a different lane
    Cleared,
}

/// Degrees the runner is past `target`, in (-180, 180]
///
/// Negative means the target is still ahead.
#[inline]
pub fn reach_offset(current_angle: f32, target_angle: f32) -> f32 {
    normalize_degrees(current_angle - target_angle)
}

/// Degrees from the runner forward to `target`, in (-180, 180]
#[inline]
pub fn angle_ahead(current_angle: f32, target_angle: f32) -> f32 {
    normalize_degrees(target_angle - current_angle)
}

/// Angular tolerance for "at this slot", scaled with rotation speed
#[inline]
pub fn collision_window(rotation_speed: f32, tuning: &Tuning) -> f32 {
    (rotation_speed.abs() * tuning.collision_window_secs).max(tuning.min_collision_window_deg)
}

/// Whether the runner has reached `target_angle` within `window`
#[inline]
pub fn has_reached(current_angle: f32, target_angle: f32, window: f32) -> bool {
    let offset = reach_offset(current_angle, target_angle);
    offset >= -REACH_LEAD_DEG && offset < window
}

/// Test the runner (angle, current radius) against an object at (slot, lane)
pub fn check_pass(
    current_angle: f32,
    current_radius: f32,
    slot: Slot,
    lane: Lane,
    window: f32,
    geometry: &LaneGeometry,
) -> PassOutcome {
    if !has_reached(current_angle, slot.angle(), window) {
        return PassOutcome::NotReached;
    }
    // Physical radius, so a runner caught mid lane change is judged where it is
    if geometry.within_margin(current_radius, lane) {
        PassOutcome::Hit
    } else {
        PassOutcome::Cleared
    }
}
