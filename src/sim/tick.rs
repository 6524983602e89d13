//! Simulation tick
//!
//! Advances the run by wall-clock time. Long frames are split into equal
//! sub-steps no longer than `max_step_secs`, so the speed-scaled collision
//! window always covers a step's worth of travel.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{PassOutcome, check_pass, collision_window, has_reached};
use super::lane::Lane;
use super::state::{EFFECT_WARNING_FRACTIONS, GameEvent, GameState, RunPhase};
use crate::consts::FULL_ORBIT_DEG;
use crate::polar_to_cartesian;

/// Player intents, applied at the start of the tick they arrive with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// One lane outward
    MoveLeft,
    /// One lane inward
    MoveRight,
    /// Single-button lane change
    SwitchLane,
    /// Leave the idle screen
    Start,
    /// New run after game over
    Restart,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub intent: Option<Intent>,
}

impl TickInput {
    pub fn intent(intent: Intent) -> Self {
        Self {
            intent: Some(intent),
        }
    }
}

/// Where to draw the runner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerPosition {
    pub angle: f32,
    pub radius: f32,
    pub lane: Lane,
    /// Offset from the orbit center
    pub point: Vec2,
}

/// Everything the presentation and persistence layers need after a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResult {
    pub phase: RunPhase,
    pub score: u64,
    pub level: u32,
    /// True only on the tick the run ended
    pub game_over: bool,
    pub position: RunnerPosition,
    pub events: Vec<GameEvent>,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> TickResult {
    if let Some(intent) = input.intent {
        apply_intent(state, intent);
    }

    let mut game_over = false;
    if state.phase == RunPhase::Playing {
        let frame = dt.clamp(0.0, state.tuning.max_frame_secs);
        let wanted = (frame / state.tuning.max_step_secs).ceil().max(1.0) as u32;
        let substeps = wanted.min(state.tuning.max_substeps);
        // Past the substep cap the frame is shortened rather than stretched
        let step_dt = (frame / substeps as f32).min(state.tuning.max_step_secs);
        if wanted > substeps {
            log::debug!("frame of {frame:.3}s capped at {substeps} substeps");
        }

        for _ in 0..substeps {
            step(state, step_dt);
            if state.phase == RunPhase::GameOver {
                game_over = true;
                break;
            }
        }
    }

    let runner = &state.runner;
    TickResult {
        phase: state.phase,
        score: state.score,
        level: state.level,
        game_over,
        position: RunnerPosition {
            angle: runner.angle,
            radius: runner.radius,
            lane: runner.lane,
            point: polar_to_cartesian(runner.radius, runner.angle),
        },
        events: std::mem::take(&mut state.events),
    }
}

fn apply_intent(state: &mut GameState, intent: Intent) {
    match (state.phase, intent) {
        (RunPhase::Idle, Intent::Start | Intent::Restart) => start_run(state),
        (RunPhase::GameOver, Intent::Restart) => {
            state.reset();
            start_run(state);
        }
        (RunPhase::Playing, Intent::MoveLeft) => {
            if let Some(lane) = state.geometry.layout.outward(state.runner.lane) {
                state.set_lane(lane);
            }
        }
        (RunPhase::Playing, Intent::MoveRight) => {
            if let Some(lane) = state.geometry.layout.inward(state.runner.lane) {
                state.set_lane(lane);
            }
        }
        (RunPhase::Playing, Intent::SwitchLane) => switch_lane(state),
        _ => {}
    }
}

fn start_run(state: &mut GameState) {
    state.phase = RunPhase::Playing;
    log::info!("run started (seed {})", state.seed);
    state.events.push(GameEvent::RunStarted { seed: state.seed });
}

/// Keep moving in the current switch direction, bouncing off the edge lanes
fn switch_lane(state: &mut GameState) {
    let layout = state.geometry.layout;
    let lane = state.runner.lane;
    let toward = |outward: bool| {
        if outward {
            layout.outward(lane)
        } else {
            layout.inward(lane)
        }
    };
    let outward = state.runner.switch_outward;
    let target = match toward(outward) {
        Some(next) => Some(next),
        None => {
            state.runner.switch_outward = !outward;
            toward(!outward)
        }
    };
    if let Some(next) = target {
        state.set_lane(next);
    }
}

/// One fixed step of the state machine
fn step(state: &mut GameState, dt: f32) {
    state.time_ticks += 1;

    // 1. Rotation
    state.runner.angle += state.runner.rotation_speed * dt;

    // 2. Lane easing
    let (rate, snap) = (state.tuning.lane_transition_rate, state.tuning.lane_snap_distance);
    state.runner.step_transition(rate, snap);

    let window = collision_window(state.runner.rotation_speed, &state.tuning);

    // 3. Current orbit: collide or score
    if check_hazards(state, window) {
        return;
    }

    // 4. Next orbit: reveal hazards as the runner sweeps over their slots
    spawn_next_orbit(state, window);

    // 5. Power-up pickup
    check_powerup(state, window);

    // 6. Orbit rollover
    if state.runner.angle >= FULL_ORBIT_DEG {
        complete_orbit(state);
        // The overshoot may already sit on slot 0 of the new orbit
        let window = collision_window(state.runner.rotation_speed, &state.tuning);
        if check_hazards(state, window) {
            return;
        }
        spawn_next_orbit(state, window);
        check_powerup(state, window);
    }

    // 7. Effect expiry
    update_effect(state);
}

/// Returns true when the run ended
fn check_hazards(state: &mut GameState, window: f32) -> bool {
    let angle = state.runner.angle;
    let radius = state.runner.radius;
    let current = state.current_orbit_level;
    let points = u64::from(state.level);
    let fade_delay_secs = state.tuning.hazard_fade_delay_secs;

    for hazard in state.hazards.iter_mut() {
        if hazard.passed || hazard.orbit_level != current {
            continue;
        }
        match check_pass(angle, radius, hazard.slot, hazard.lane, window, &state.geometry) {
            PassOutcome::NotReached => {}
            PassOutcome::Hit if state.is_invincible => {
                hazard.passed = true;
                state.events.push(GameEvent::HazardShielded { id: hazard.id });
            }
            PassOutcome::Hit => {
                state.phase = RunPhase::GameOver;
                log::info!(
                    "game over: hazard {} at slot {} lane {:?}, score {} level {}",
                    hazard.id,
                    hazard.slot.index(),
                    hazard.lane,
                    state.score,
                    state.level
                );
                state.events.push(GameEvent::GameOver {
                    score: state.score,
                    level: state.level,
                });
                return true;
            }
            PassOutcome::Cleared => {
                hazard.passed = true;
                state.score += points;
                state.events.push(GameEvent::HazardPassed {
                    id: hazard.id,
                    points,
                    fade_delay_secs,
                });
            }
        }
    }
    false
}

fn spawn_next_orbit(state: &mut GameState, window: f32) {
    let angle = state.runner.angle;
    let next = state.next_orbit_level;
    for hazard in state.hazards.iter_mut() {
        if hazard.spawned || hazard.orbit_level != next {
            continue;
        }
        if has_reached(angle, hazard.angle(), window) {
            hazard.spawned = true;
            state.events.push(GameEvent::HazardSpawned {
                id: hazard.id,
                slot: hazard.slot,
                lane: hazard.lane,
                orbit_level: next,
            });
        }
    }
}

fn check_powerup(state: &mut GameState, window: f32) {
    let Some(powerup) = state.powerup.as_mut() else {
        return;
    };
    if powerup.collected {
        return;
    }
    let outcome = check_pass(
        state.runner.angle,
        state.runner.radius,
        powerup.slot,
        powerup.lane,
        window,
        &state.geometry,
    );
    if outcome != PassOutcome::Hit {
        return;
    }
    powerup.collected = true;
    let kind = powerup.kind;
    state.powerup = None;
    state.events.push(GameEvent::PowerUpCollected { kind });
    if !state.activate_effect(kind) {
        log::debug!("{kind:?} collected while another effect runs; discarded");
    }
}

fn complete_orbit(state: &mut GameState) {
    // Keep the overshoot so no progress is lost
    state.runner.angle -= FULL_ORBIT_DEG;
    if let Some(effect) = state.effect.as_mut() {
        effect.start_angle -= FULL_ORBIT_DEG;
    }

    state.current_orbit_level += 1;
    state.next_orbit_level += 1;
    state.level += 1;
    state.refresh_speed();
    log::info!(
        "level {} (speed {:.1} deg/s, score {})",
        state.level,
        state.runner.rotation_speed,
        state.score
    );
    state.events.push(GameEvent::LevelUp {
        level: state.level,
        rotation_speed: state.runner.rotation_speed,
    });

    state.populate_orbit(state.next_orbit_level, false);
    state.cleanup_old_hazards();
    state.run_powerup_lifecycle();
}

fn update_effect(state: &mut GameState) {
    let Some(effect) = state.effect else {
        return;
    };
    let duration = state.tuning.effect_duration_deg;
    let progress = effect.progress(state.runner.angle);

    if progress >= duration {
        state.deactivate_effect();
        return;
    }

    // Advisory warnings only; expiry above is the only gameplay cutoff
    let due = EFFECT_WARNING_FRACTIONS
        .iter()
        .filter(|&&f| progress >= f * duration)
        .count() as u8;
    if due > effect.warnings_sent {
        if let Some(active) = state.effect.as_mut() {
            active.warnings_sent = due;
        }
        state.events.push(GameEvent::EffectWarning {
            kind: effect.kind,
            stage: due,
        });
    }
}
