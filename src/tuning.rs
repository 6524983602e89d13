//! Data-driven game balance
//!
//! Every product-tuning constant lives here so alternate configurations
//! (two lanes, 0.7% speed ramp, spaced generation) are a JSON override away.
//! Missing keys fall back to [`Tuning::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Device size category reported by the viewport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Desktop => "Desktop",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mobile" | "touch" => Some(DeviceClass::Mobile),
            "desktop" => Some(DeviceClass::Desktop),
            _ => None,
        }
    }
}

/// Which level generator to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// Carve a guaranteed path first, then scatter hazards around it
    #[default]
    SafePathFirst,
    /// Pick spaced slots, assign lanes fairly, then verify an enterable gap
    Spaced,
}

/// Game balance knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Lanes ===
    /// 2 = {inner, outer}, 3 = {inner, middle, outer}
    pub lane_count: usize,
    /// Inner lane radius / outer lane radius
    pub inner_lane_fraction: f32,
    /// Share of the short viewport side used by the orbit on mobile
    pub mobile_viewport_fraction: f32,
    /// Share of the short viewport side used by the orbit on desktop
    pub desktop_viewport_fraction: f32,
    pub lane_transition_rate: f32,
    pub lane_snap_distance: f32,
    /// Collision margin as a fraction of the inner-to-middle spacing
    pub collision_margin_fraction: f32,

    // === Speed ===
    /// Level 1 rotation speed (degrees per second)
    pub base_speed_dps: f32,
    /// 0.01 and 0.007 both shipped; linear in (level - 1)
    pub speed_increase_per_level: f32,
    pub slow_factor: f32,

    // === Collision / stepping ===
    pub min_collision_window_deg: f32,
    /// Window grows as speed * this many seconds
    pub collision_window_secs: f32,
    /// Longest simulated step; larger frames are sub-stepped
    pub max_step_secs: f32,
    pub max_substeps: u32,
    /// Frames longer than this are clamped (tab switch, debugger)
    pub max_frame_secs: f32,

    // === Power-ups ===
    pub effect_duration_deg: f32,
    /// Spawn attempt on every level divisible by this
    pub powerup_interval_levels: u32,
    /// Unclaimed power-ups despawn after this many levels
    pub powerup_lifetime_levels: u32,
    /// Suggested delay before a passed hazard fades (presentation only)
    pub hazard_fade_delay_secs: f32,

    // === Generation ===
    pub strategy: GenerationStrategy,
    /// Chance of a second safe lane per slot, up to `choice_level_threshold`
    pub choice_chance_early: f64,
    /// Chance of a second safe lane per slot, beyond the threshold
    pub choice_chance_late: f64,
    pub choice_level_threshold: u32,
    pub lane_change_chance: f64,
    /// Primary lane is forced to move after this many stable slots
    pub max_stable_slots: u32,
    pub density_early: f32,
    pub density_early_max_level: u32,
    pub density_mid: f32,
    pub density_mid_max_level: u32,
    pub density_late: f32,
    /// Level whose opening stretch is kept clear
    pub tutorial_level: u32,
    /// Angles below this stay hazard-free on the tutorial level
    pub tutorial_clear_deg: f32,

    // === Spaced generation ===
    pub spaced_base_hazards: usize,
    pub spaced_hazards_per_level: f32,
    /// Minimum slot gap between hazards on level 1
    pub spaced_start_spacing: usize,
    pub spaced_min_spacing: usize,
    /// Spacing tightens by one slot every this many levels
    pub spaced_tighten_every: u32,
    /// Some lane must keep a hazard-free run at least this wide
    pub min_enterable_gap_deg: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lane_count: 3,
            inner_lane_fraction: INNER_LANE_FRACTION,
            mobile_viewport_fraction: 0.95,
            desktop_viewport_fraction: 0.75,
            lane_transition_rate: LANE_TRANSITION_RATE,
            lane_snap_distance: LANE_SNAP_DISTANCE,
            collision_margin_fraction: COLLISION_MARGIN_FRACTION,

            base_speed_dps: BASE_ROTATION_SPEED,
            speed_increase_per_level: SPEED_INCREASE_PER_LEVEL,
            slow_factor: SLOW_FACTOR,

            min_collision_window_deg: MIN_COLLISION_WINDOW_DEG,
            collision_window_secs: 0.1,
            max_step_secs: 0.1,
            max_substeps: 8,
            max_frame_secs: 0.5,

            effect_duration_deg: EFFECT_DURATION_DEG,
            powerup_interval_levels: 3,
            powerup_lifetime_levels: 3,
            hazard_fade_delay_secs: 0.3,

            strategy: GenerationStrategy::SafePathFirst,
            choice_chance_early: 0.7,
            choice_chance_late: 0.5,
            choice_level_threshold: 10,
            lane_change_chance: 0.4,
            max_stable_slots: 4,
            density_early: 0.25,
            density_early_max_level: 5,
            density_mid: 0.35,
            density_mid_max_level: 15,
            density_late: 0.45,
            tutorial_level: 1,
            tutorial_clear_deg: 90.0,

            spaced_base_hazards: 3,
            spaced_hazards_per_level: 0.5,
            spaced_start_spacing: 3,
            spaced_min_spacing: 1,
            spaced_tighten_every: 4,
            min_enterable_gap_deg: 45.0,
        }
    }
}

impl Tuning {
    /// Two-lane layout from the earliest builds
    pub fn two_lane() -> Self {
        Self {
            lane_count: 2,
            ..Self::default()
        }
    }

    /// Parse and validate a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load an override from disk; a missing or unreadable file is an error
    pub fn from_file(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Viewport share for a device class
    pub fn viewport_fraction(&self, device: DeviceClass) -> f32 {
        match device {
            DeviceClass::Mobile => self.mobile_viewport_fraction,
            DeviceClass::Desktop => self.desktop_viewport_fraction,
        }
    }

    /// Level-scaled rotation speed before effects (degrees per second)
    pub fn speed_for_level(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1) as f32;
        self.base_speed_dps * (1.0 + steps * self.speed_increase_per_level)
    }

    /// Share of hazard-capable positions filled on a level
    pub fn density_for_level(&self, orbit_level: u32) -> f32 {
        if orbit_level <= self.density_early_max_level {
            self.density_early
        } else if orbit_level <= self.density_mid_max_level {
            self.density_mid
        } else {
            self.density_late
        }
    }

    /// Probability of offering a second safe lane at a slot
    pub fn choice_chance(&self, orbit_level: u32) -> f64 {
        if orbit_level <= self.choice_level_threshold {
            self.choice_chance_early
        } else {
            self.choice_chance_late
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        fn out_of_range(field: &'static str, reason: impl Into<String>) -> TuningError {
            TuningError::OutOfRange {
                field,
                reason: reason.into(),
            }
        }

        if !(2..=3).contains(&self.lane_count) {
            return Err(out_of_range("lane_count", format!("{} not in 2..=3", self.lane_count)));
        }
        if !(self.inner_lane_fraction > 0.0 && self.inner_lane_fraction < 1.0) {
            return Err(out_of_range("inner_lane_fraction", "must be in (0, 1)"));
        }
        // Wider margins would let adjacent lane bands overlap
        if !(self.collision_margin_fraction > 0.0 && self.collision_margin_fraction <= 0.5) {
            return Err(out_of_range("collision_margin_fraction", "must be in (0, 0.5]"));
        }
        for (field, value) in [
            ("mobile_viewport_fraction", self.mobile_viewport_fraction),
            ("desktop_viewport_fraction", self.desktop_viewport_fraction),
            ("lane_transition_rate", self.lane_transition_rate),
            ("slow_factor", self.slow_factor),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(out_of_range(field, "must be in (0, 1]"));
            }
        }
        for (field, value) in [
            ("density_early", self.density_early),
            ("density_mid", self.density_mid),
            ("density_late", self.density_late),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(field, "must be in [0, 1]"));
            }
        }
        for (field, value) in [
            ("choice_chance_early", self.choice_chance_early),
            ("choice_chance_late", self.choice_chance_late),
            ("lane_change_chance", self.lane_change_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(field, "must be in [0, 1]"));
            }
        }
        if self.base_speed_dps <= 0.0 {
            return Err(out_of_range("base_speed_dps", "must be positive"));
        }
        if self.speed_increase_per_level < 0.0 {
            return Err(out_of_range("speed_increase_per_level", "must not be negative"));
        }
        if self.effect_duration_deg <= 0.0 {
            return Err(out_of_range("effect_duration_deg", "must be positive"));
        }
        if self.max_step_secs <= 0.0 || self.max_frame_secs <= 0.0 {
            return Err(out_of_range("max_step_secs", "step and frame limits must be positive"));
        }
        if self.max_substeps == 0 {
            return Err(out_of_range("max_substeps", "must be at least 1"));
        }
        // The collision window has to cover a full step of travel or fast ticks skip hazards
        if self.collision_window_secs < self.max_step_secs {
            return Err(out_of_range(
                "collision_window_secs",
                format!(
                    "{} shorter than max_step_secs {}",
                    self.collision_window_secs, self.max_step_secs
                ),
            ));
        }
        if self.min_collision_window_deg <= 0.0 || self.min_collision_window_deg >= 180.0 {
            return Err(out_of_range("min_collision_window_deg", "must be in (0, 180)"));
        }
        if self.powerup_interval_levels == 0 {
            return Err(out_of_range("powerup_interval_levels", "must be at least 1"));
        }
        if self.spaced_min_spacing == 0 || self.spaced_start_spacing < self.spaced_min_spacing {
            return Err(out_of_range(
                "spaced_min_spacing",
                "must be at least 1 and not above spaced_start_spacing",
            ));
        }
        Ok(())
    }
}
