//! Game state and core simulation types
//!
//! `GameState` exclusively owns the hazard set, the power-up slot and the
//! active effect. Everything random flows through its seeded RNG so a seed
//! plus an input sequence replays exactly.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generator::generate_level;
use super::lane::{Lane, LaneGeometry, LaneLayout, Slot};
use super::powerup::spawn_powerup;
use crate::error::TuningError;
use crate::tuning::{DeviceClass, Tuning};

/// Play field assumed until the viewport layer reports a real size
pub const DEFAULT_FIELD_WIDTH: f32 = 800.0;
pub const DEFAULT_FIELD_HEIGHT: f32 = 800.0;

/// Effect progress (fraction of duration) at which warning stages fire
pub const EFFECT_WARNING_FRACTIONS: [f32; 4] = [0.5, 0.75, 0.875, 165.0 / 180.0];

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Waiting for the start press
    Idle,
    /// Runner is orbiting
    Playing,
    /// Collided; only a restart leaves this phase
    GameOver,
}

/// A hazard placed on a (slot, lane) pair for one orbit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Assigned when the hazard enters a `GameState`; 0 until then
    pub id: u32,
    pub slot: Slot,
    pub lane: Lane,
    /// Palette index (cosmetic)
    pub color: u8,
    /// Orbit this hazard belongs to
    pub orbit_level: u32,
    /// Runner has safely gone by
    pub passed: bool,
    /// Visible on the field
    pub spawned: bool,
}

impl Hazard {
    pub fn new(slot: Slot, lane: Lane, color: u8, orbit_level: u32) -> Self {
        Self {
            id: 0,
            slot,
            lane,
            color,
            orbit_level,
            passed: false,
            spawned: false,
        }
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.slot.angle()
    }

    #[inline]
    pub fn occupies(&self, slot: Slot, lane: Lane) -> bool {
        self.slot == slot && self.lane == lane
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Halves rotation speed
    SlowTime,
    /// Hazards are harmless
    Invincibility,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 2] = [PowerUpKind::SlowTime, PowerUpKind::Invincibility];
}

/// A collectible sitting on a (slot, lane) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub slot: Slot,
    pub lane: Lane,
    pub collected: bool,
    /// Display level when it appeared, for level-based expiry
    pub spawned_at_level: u32,
}

impl PowerUp {
    #[inline]
    pub fn occupies(&self, slot: Slot, lane: Lane) -> bool {
        self.slot == slot && self.lane == lane
    }
}

/// The single effect that may be running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    /// Runner angle at pickup, shifted down 360 at every rollover
    pub start_angle: f32,
    /// Warning stages already announced
    pub warnings_sent: u8,
}

impl ActiveEffect {
    /// Degrees traveled since pickup
    pub fn progress(&self, current_angle: f32) -> f32 {
        let mut progress = current_angle - self.start_angle;
        if progress < 0.0 {
            progress += crate::consts::FULL_ORBIT_DEG;
        }
        progress
    }
}

/// The player's marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    /// Degrees, [0, 360) between ticks
    pub angle: f32,
    /// Logical lane (target of any running transition)
    pub lane: Lane,
    /// Physical radius, eased toward `target_radius`
    pub radius: f32,
    pub target_radius: f32,
    pub transitioning: bool,
    /// Degrees per second, effects included
    pub rotation_speed: f32,
    /// Direction the switch-lane intent currently moves in
    pub switch_outward: bool,
}

impl Runner {
    fn new(geometry: &LaneGeometry, rotation_speed: f32) -> Self {
        let lane = geometry.layout.outermost();
        let radius = geometry.radius(lane);
        Self {
            angle: 0.0,
            lane,
            radius,
            target_radius: radius,
            transitioning: false,
            rotation_speed,
            switch_outward: false,
        }
    }

    /// Ease the physical radius one step toward the lane
    pub fn step_transition(&mut self, rate: f32, snap_distance: f32) {
        if !self.transitioning {
            return;
        }
        let diff = self.target_radius - self.radius;
        self.radius += diff * rate;
        if diff.abs() < snap_distance {
            self.radius = self.target_radius;
            self.transitioning = false;
        }
    }
}

/// Something the presentation layer may want to animate or play a sound for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted { seed: u64 },
    /// Previous run discarded; drop any pending timers bound to it
    RunReset,
    LaneChanged { lane: Lane },
    HazardSpawned { id: u32, slot: Slot, lane: Lane, orbit_level: u32 },
    /// Safely passed; fade it out after the suggested delay
    HazardPassed { id: u32, points: u64, fade_delay_secs: f32 },
    /// Touched while invincible
    HazardShielded { id: u32 },
    /// Removed from the field (orbit left behind)
    HazardDespawned { id: u32 },
    PowerUpSpawned { kind: PowerUpKind, slot: Slot, lane: Lane },
    PowerUpCollected { kind: PowerUpKind },
    /// Unclaimed for too many levels
    PowerUpExpired { kind: PowerUpKind },
    EffectStarted { kind: PowerUpKind },
    /// Advisory; stage counts up from 1 as expiry nears
    EffectWarning { kind: PowerUpKind, stage: u8 },
    EffectEnded { kind: PowerUpKind },
    LevelUp { level: u32, rotation_speed: f32 },
    /// Final score for the high-score and leaderboard collaborators
    GameOver { score: u64, level: u32 },
}

/// Complete run state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub geometry: LaneGeometry,
    pub phase: RunPhase,
    pub score: u64,
    /// Display level, +1 per completed orbit
    pub level: u32,
    /// Orbit whose hazards are live
    pub current_orbit_level: u32,
    /// Pre-generated orbit, always current + 1
    pub next_orbit_level: u32,
    pub runner: Runner,
    /// Hazards of the current and next orbit
    pub hazards: Vec<Hazard>,
    pub powerup: Option<PowerUp>,
    pub effect: Option<ActiveEffect>,
    pub is_invincible: bool,
    /// Simulation steps taken this run
    pub time_ticks: u64,
    /// Events not yet handed out by `tick`
    pub(crate) events: Vec<GameEvent>,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// New run with default tuning on the default play field
    pub fn new(seed: u64) -> Self {
        let tuning = Tuning::default();
        let geometry = LaneGeometry::for_viewport(
            DEFAULT_FIELD_WIDTH,
            DEFAULT_FIELD_HEIGHT,
            DeviceClass::Desktop,
            &tuning,
        );
        Self::build(seed, tuning, geometry)
    }

    /// New run with explicit tuning and lane geometry. The tuning is validated
    /// and the geometry takes its lane layout from `tuning.lane_count`.
    pub fn with_config(
        seed: u64,
        tuning: Tuning,
        mut geometry: LaneGeometry,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        if let Some(layout) = LaneLayout::from_count(tuning.lane_count) {
            geometry.layout = layout;
        }
        Ok(Self::build(seed, tuning, geometry))
    }

    fn build(seed: u64, tuning: Tuning, geometry: LaneGeometry) -> Self {
        let speed = tuning.speed_for_level(1);
        let mut state = Self {
            seed,
            runner: Runner::new(&geometry, speed),
            tuning,
            geometry,
            phase: RunPhase::Idle,
            score: 0,
            level: 1,
            current_orbit_level: 1,
            next_orbit_level: 2,
            hazards: Vec::new(),
            powerup: None,
            effect: None,
            is_invincible: false,
            time_ticks: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        };
        state.populate_orbits();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Discard the run and start a fresh one in place
    ///
    /// Tuning, geometry and the RNG stream carry over; everything else is new.
    pub fn reset(&mut self) {
        let speed = self.tuning.speed_for_level(1);
        self.runner = Runner::new(&self.geometry, speed);
        self.phase = RunPhase::Idle;
        self.score = 0;
        self.level = 1;
        self.current_orbit_level = 1;
        self.next_orbit_level = 2;
        self.hazards.clear();
        self.powerup = None;
        self.effect = None;
        self.is_invincible = false;
        self.time_ticks = 0;
        self.events.clear();
        self.events.push(GameEvent::RunReset);
        self.populate_orbits();
    }

    /// Current orbit goes live immediately, the next one waits for the runner
    fn populate_orbits(&mut self) {
        self.populate_orbit(self.current_orbit_level, true);
        self.populate_orbit(self.next_orbit_level, false);
    }

    /// Generate and insert hazards for one orbit
    pub(crate) fn populate_orbit(&mut self, orbit_level: u32, spawned: bool) {
        let generated = generate_level(
            orbit_level,
            &self.geometry,
            self.powerup.as_ref(),
            &self.tuning,
            &mut self.rng,
        );
        log::debug!("orbit {} generated {} hazards", orbit_level, generated.len());
        for mut hazard in generated {
            hazard.id = self.next_entity_id();
            hazard.spawned = spawned;
            if spawned {
                self.events.push(GameEvent::HazardSpawned {
                    id: hazard.id,
                    slot: hazard.slot,
                    lane: hazard.lane,
                    orbit_level,
                });
            }
            self.hazards.push(hazard);
        }
    }

    /// Drop hazards from orbits already left behind
    pub(crate) fn cleanup_old_hazards(&mut self) {
        let current = self.current_orbit_level;
        let events = &mut self.events;
        self.hazards.retain(|h| {
            if h.orbit_level >= current {
                return true;
            }
            events.push(GameEvent::HazardDespawned { id: h.id });
            false
        });
    }

    /// Despawn a stale power-up, then try to place a new one on schedule
    pub(crate) fn run_powerup_lifecycle(&mut self) {
        if let Some(powerup) = &self.powerup {
            let age = self.level.saturating_sub(powerup.spawned_at_level);
            if age >= self.tuning.powerup_lifetime_levels {
                let kind = powerup.kind;
                log::debug!("power-up {:?} expired after {} levels", kind, age);
                self.powerup = None;
                self.events.push(GameEvent::PowerUpExpired { kind });
            }
        }

        if self.powerup.is_some() || self.level % self.tuning.powerup_interval_levels.max(1) != 0 {
            return;
        }
        let current = self.current_orbit_level;
        let blocking: Vec<&Hazard> = self
            .hazards
            .iter()
            .filter(|h| h.orbit_level == current && !h.passed)
            .collect();
        if let Some(mut powerup) = spawn_powerup(&blocking, &self.geometry, &mut self.rng) {
            powerup.spawned_at_level = self.level;
            log::debug!(
                "power-up {:?} at slot {} lane {:?}",
                powerup.kind,
                powerup.slot.index(),
                powerup.lane
            );
            self.events.push(GameEvent::PowerUpSpawned {
                kind: powerup.kind,
                slot: powerup.slot,
                lane: powerup.lane,
            });
            self.powerup = Some(powerup);
        }
    }

    /// Level speed, reduced while slow time runs
    pub fn refresh_speed(&mut self) {
        let mut speed = self.tuning.speed_for_level(self.level);
        if matches!(self.effect, Some(e) if e.kind == PowerUpKind::SlowTime) {
            speed *= self.tuning.slow_factor;
        }
        self.runner.rotation_speed = speed;
    }

    /// Start an effect unless one is already running
    pub(crate) fn activate_effect(&mut self, kind: PowerUpKind) -> bool {
        if self.effect.is_some() {
            return false;
        }
        self.effect = Some(ActiveEffect {
            kind,
            start_angle: self.runner.angle,
            warnings_sent: 0,
        });
        if kind == PowerUpKind::Invincibility {
            self.is_invincible = true;
        }
        self.refresh_speed();
        self.events.push(GameEvent::EffectStarted { kind });
        true
    }

    /// End the running effect and restore baseline speed and vulnerability
    pub(crate) fn deactivate_effect(&mut self) {
        if let Some(effect) = self.effect.take() {
            self.is_invincible = false;
            self.refresh_speed();
            self.events.push(GameEvent::EffectEnded { kind: effect.kind });
        }
    }

    /// Move the logical lane and start easing toward it
    pub(crate) fn set_lane(&mut self, lane: Lane) {
        if lane == self.runner.lane {
            return;
        }
        self.runner.lane = lane;
        self.runner.target_radius = self.geometry.radius(lane);
        self.runner.transitioning = true;
        self.events.push(GameEvent::LaneChanged { lane });
    }

    /// Recompute lane radii for a new play field size
    ///
    /// The runner keeps its logical lane; its physical radius scales with the field.
    pub fn resize(&mut self, width: f32, height: f32, device: DeviceClass) {
        let old_outer = self.geometry.outer_radius;
        let layout = self.geometry.layout;
        let mut geometry = LaneGeometry::for_viewport(width, height, device, &self.tuning);
        geometry.layout = layout;
        if old_outer > 0.0 {
            self.runner.radius *= geometry.outer_radius / old_outer;
        }
        self.runner.target_radius = geometry.radius(self.runner.lane);
        self.runner.transitioning = self.runner.radius != self.runner.target_radius;
        self.geometry = geometry;
    }

    /// Score to hand to high-score storage once the run is over
    pub fn final_score(&self) -> Option<u64> {
        (self.phase == RunPhase::GameOver).then_some(self.score)
    }

    /// Hazards of one orbit that have not been passed
    pub fn live_hazards(&self, orbit_level: u32) -> impl Iterator<Item = &Hazard> {
        self.hazards
            .iter()
            .filter(move |h| h.orbit_level == orbit_level && !h.passed)
    }

    /// Whether an un-passed hazard of `orbit_level` sits at (slot, lane)
    pub fn is_blocked(&self, orbit_level: u32, slot: Slot, lane: Lane) -> bool {
        self.live_hazards(orbit_level).any(|h| h.occupies(slot, lane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_two_orbits() {
        let state = GameState::new(42);
        assert_eq!(state.phase, RunPhase::Idle);
        assert_eq!(state.level, 1);
        assert_eq!(state.current_orbit_level, 1);
        assert_eq!(state.next_orbit_level, 2);
        assert!(state.hazards.iter().all(|h| h.orbit_level == 1 || h.orbit_level == 2));
        assert!(state.hazards.iter().any(|h| h.orbit_level == 2));
        // Current orbit is live, next orbit waits for the runner
        assert!(state.hazards.iter().filter(|h| h.orbit_level == 1).all(|h| h.spawned));
        assert!(state.hazards.iter().filter(|h| h.orbit_level == 2).all(|h| !h.spawned));
    }

    #[test]
    fn test_ids_unique() {
        let state = GameState::new(7);
        let mut ids: Vec<u32> = state.hazards.iter().map(|h| h.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), state.hazards.len());
        assert!(ids.iter().all(|&id| id != 0));
    }

    #[test]
    fn test_runner_starts_outer() {
        let state = GameState::new(1);
        assert_eq!(state.runner.lane, Lane::Outer);
        assert_eq!(state.runner.radius, state.geometry.outer_radius);
        assert_eq!(state.runner.angle, 0.0);
    }

    #[test]
    fn test_with_config_takes_layout_from_tuning() {
        let geo = LaneGeometry::from_outer_radius(300.0, LaneLayout::Three, 0.6);
        let state = GameState::with_config(9, Tuning::two_lane(), geo).expect("valid tuning");
        assert_eq!(state.geometry.layout, LaneLayout::Two);
        assert!(state.hazards.iter().all(|h| h.lane != Lane::Middle));
    }

    #[test]
    fn test_with_config_rejects_invalid_tuning() {
        let geo = LaneGeometry::from_outer_radius(300.0, LaneLayout::Three, 0.6);
        let tuning = Tuning {
            powerup_interval_levels: 0,
            ..Tuning::default()
        };
        let err = GameState::with_config(9, tuning, geo).unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                field: "powerup_interval_levels",
                ..
            }
        ));
    }

    #[test]
    fn test_runner_transition_snaps() {
        let geo = LaneGeometry::from_outer_radius(300.0, LaneLayout::Three, 0.6);
        let mut runner = Runner::new(&geo, 90.0);
        runner.target_radius = geo.middle_radius;
        runner.transitioning = true;
        for _ in 0..100 {
            runner.step_transition(0.15, 1.0);
        }
        assert!(!runner.transitioning);
        assert_eq!(runner.radius, geo.middle_radius);
    }

    #[test]
    fn test_slow_time_halves_speed() {
        let mut state = GameState::new(3);
        let base = state.runner.rotation_speed;
        assert!(state.activate_effect(PowerUpKind::SlowTime));
        assert!((state.runner.rotation_speed - base * 0.5).abs() < 1e-4);
        // Second activation is refused while one runs
        assert!(!state.activate_effect(PowerUpKind::Invincibility));
        assert!(!state.is_invincible);
        state.deactivate_effect();
        assert_eq!(state.runner.rotation_speed, base);
    }

    #[test]
    fn test_resize_keeps_lane() {
        let mut state = GameState::new(5);
        state.set_lane(Lane::Middle);
        state.resize(400.0, 400.0, DeviceClass::Mobile);
        assert_eq!(state.runner.lane, Lane::Middle);
        assert_eq!(state.runner.target_radius, state.geometry.middle_radius);
        assert!((state.geometry.outer_radius - 190.0).abs() < 1e-3);
    }

    #[test]
    fn test_cleanup_drops_old_orbits() {
        let mut state = GameState::new(11);
        state.current_orbit_level = 2;
        state.next_orbit_level = 3;
        state.cleanup_old_hazards();
        assert!(state.hazards.iter().all(|h| h.orbit_level >= 2));
    }

    #[test]
    fn test_effect_progress_wraps() {
        let effect = ActiveEffect {
            kind: PowerUpKind::Invincibility,
            start_angle: 350.0,
            warnings_sent: 0,
        };
        assert!((effect.progress(10.0) - 20.0).abs() < 1e-4);
        assert!((effect.progress(355.0) - 5.0).abs() < 1e-4);
    }
}
