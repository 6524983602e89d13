//! Orbit Runner - A lane-dodging arcade game around concentric orbits
//!
//! Core modules:
//! - `sim`: Deterministic simulation (lane geometry, level generation, collisions, progression)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Leaderboard data handed to the persistence layer
//! - `autopilot`: Look-ahead bot used by the headless binary
//! - `error`: Error taxonomy for generation, spawning and configuration

pub mod autopilot;
pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use error::{GenerationError, OrbitError, SpawnError, TuningError};
pub use highscores::HighScores;
pub use tuning::{DeviceClass, GenerationStrategy, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Discrete angular positions around the orbit
    pub const SLOT_COUNT: usize = 16;
    /// Degrees between adjacent slots
    pub const SLOT_SPACING_DEG: f32 = 360.0 / SLOT_COUNT as f32;
    /// Degrees in one full orbit
    pub const FULL_ORBIT_DEG: f32 = 360.0;

    /// One orbit every 4.2 seconds at level 1 (degrees per second)
    pub const BASE_ROTATION_SPEED: f32 = 360.0 / 4.2;
    /// Speed gained per level (multiplicative on base, linear in level)
    pub const SPEED_INCREASE_PER_LEVEL: f32 = 0.01;
    /// Speed multiplier while a slow effect is active
    pub const SLOW_FACTOR: f32 = 0.5;

    /// Power-up effects last half an orbit of travel
    pub const EFFECT_DURATION_DEG: f32 = 180.0;

    /// Collision window never shrinks below this (degrees)
    pub const MIN_COLLISION_WINDOW_DEG: f32 = 8.0;
    /// Reach test tolerates the player sitting this far before a slot (degrees)
    pub const REACH_LEAD_DEG: f32 = 1.0;

    /// Inner lane radius as a fraction of the outer lane radius
    pub const INNER_LANE_FRACTION: f32 = 0.6;
    /// Collision margin as a fraction of half the inner-to-outer spacing
    pub const COLLISION_MARGIN_FRACTION: f32 = 1.0 / 3.0;

    /// Fraction of remaining radial distance closed per lane-transition step
    pub const LANE_TRANSITION_RATE: f32 = 0.15;
    /// Radial distance below which a lane transition snaps to its target
    pub const LANE_SNAP_DISTANCE: f32 = 1.0;

    /// Hazard palette size (cosmetic)
    pub const HAZARD_COLOR_COUNT: u8 = 5;
}

/// Normalize a signed angle difference to (-180, 180] degrees
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(consts::FULL_ORBIT_DEG);
    if wrapped > 180.0 {
        wrapped - consts::FULL_ORBIT_DEG
    } else {
        wrapped
    }
}

/// Wrap an absolute angle into [0, 360) degrees
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(consts::FULL_ORBIT_DEG);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= consts::FULL_ORBIT_DEG {
        0.0
    } else {
        wrapped
    }
}

/// Convert polar (r, degrees) to cartesian (x, y) relative to the orbit center
#[inline]
pub fn polar_to_cartesian(r: f32, degrees: f32) -> Vec2 {
    let theta = degrees.to_radians();
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(540.0), 180.0);
        assert!((normalize_degrees(181.0) - (-179.0)).abs() < 1e-4);
        assert_eq!(normalize_degrees(0.0), 0.0);
    }

    #[test]
    fn test_normalize_across_zero() {
        // Player at 359, hazard at 1: the hazard is 2 degrees ahead, not 358 behind
        assert!((normalize_degrees(1.0 - 359.0) - 2.0).abs() < 1e-4);
        // And the player is 2 degrees short of reaching it
        assert!((normalize_degrees(359.0 - 1.0) - (-2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(361.5), 1.5);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(0.0), 0.0);
        let tiny = wrap_degrees(-1e-9);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(10.0, 90.0);
        assert!(p.x.abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
    }
}
