//! Error types
//!
//! Generation and spawning failures are recovered inside the simulation
//! (fewer hazards, skipped spawn cycle) and never reach the player. They are
//! still real values so the recovery paths can be logged and tested.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while producing a level's hazards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Placed hazards leave no lane-by-lane path through every slot.
    #[error("level {orbit_level} infeasible: {hazards} hazards leave no safe path")]
    Infeasible {
        /// Orbit level being generated.
        orbit_level: u32,
        /// Hazard count that was attempted.
        hazards: usize,
    },
}

/// Failures while placing a power-up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// Every (slot, lane) pair is occupied by an un-passed hazard.
    #[error("no free slot for a power-up")]
    NoAvailableSlot,
}

/// Invalid tuning values.
#[derive(Error, Debug)]
pub enum TuningError {
    /// Configuration JSON could not be parsed.
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("cannot read tuning file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A field holds a value outside its allowed range.
    #[error("invalid tuning value for {field}: {reason}")]
    OutOfRange {
        /// Field name as it appears in the JSON.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum OrbitError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Tuning(#[from] TuningError),

    /// Leaderboard JSON could not be encoded or decoded.
    #[error("high score data: {0}")]
    HighScores(serde_json::Error),
}
