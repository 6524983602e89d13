//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, owned by `GameState`
//! - Stable iteration order (hazards in insertion order)
//! - Time enters only through `tick`'s `dt`
//! - No rendering or platform dependencies

pub mod collision;
pub mod generator;
pub mod lane;
pub mod powerup;
pub mod state;
pub mod tick;

pub use collision::{PassOutcome, angle_ahead, check_pass, collision_window, has_reached, reach_offset};
pub use generator::{daily_seed, find_safe_path, generate_level, try_generate_level, verify_solvable};
pub use lane::{Lane, LaneGeometry, LaneLayout, Slot};
pub use powerup::{spawn_powerup, try_spawn_powerup};
pub use state::{
    ActiveEffect, GameEvent, GameState, Hazard, PowerUp, PowerUpKind, RunPhase, Runner,
    DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH,
};
pub use tick::{Intent, RunnerPosition, TickInput, TickResult, tick};
