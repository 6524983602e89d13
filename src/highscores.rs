//! High score leaderboard
//!
//! Tracks the top 10 finished runs. Storage is the host's business; the
//! leaderboard only round-trips through JSON.

use serde::{Deserialize, Serialize};

use crate::error::OrbitError;
use crate::sim::GameState;

pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Orbit the run ended on
    pub level: u32,
    /// Run seed, so a daily run can be told apart from a random one
    #[serde(default)]
    pub seed: u64,
    /// Unix time in ms
    pub timestamp: f64,
}

impl HighScoreEntry {
    /// Board order: score, then the deeper orbit. Full ties keep the older run ahead.
    fn beaten_by(&self, score: u64, level: u32) -> bool {
        (score, level) > (self.score, self.level)
    }
}

/// Best finished runs, highest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board index a run would land on, or None if it would fall off the end
    fn slot_for(&self, score: u64, level: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.beaten_by(score, level))
            .unwrap_or(self.entries.len());
        (index < MAX_HIGH_SCORES).then_some(index)
    }

    /// Whether a run with this score and level would make the board
    pub fn qualifies(&self, score: u64, level: u32) -> bool {
        self.slot_for(score, level).is_some()
    }

    /// 1-based rank a run would take
    pub fn potential_rank(&self, score: u64, level: u32) -> Option<usize> {
        self.slot_for(score, level).map(|i| i + 1)
    }

    /// Insert a run if it makes the board and return its 1-based rank
    pub fn add_score(&mut self, score: u64, level: u32, seed: u64, timestamp: f64) -> Option<usize> {
        let index = self.slot_for(score, level)?;
        self.entries.insert(
            index,
            HighScoreEntry {
                score,
                level,
                seed,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    /// Record a finished run; does nothing while the run is still going
    pub fn record_run(&mut self, state: &GameState, timestamp: f64) -> Option<usize> {
        let score = state.final_score()?;
        let rank = self.add_score(score, state.level, state.seed, timestamp);
        match rank {
            Some(rank) => log::info!("new high score #{rank}: {score} (level {})", state.level),
            None => log::debug!("score {score} missed the board"),
        }
        rank
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn from_json(json: &str) -> Result<Self, OrbitError> {
        let mut scores: HighScores = serde_json::from_str(json).map_err(OrbitError::HighScores)?;
        // Hand-edited files may be unsorted or too long
        scores
            .entries
            .sort_by(|a, b| (b.score, b.level).cmp(&(a.score, a.level)));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }

    pub fn to_json(&self) -> Result<String, OrbitError> {
        serde_json::to_string(self).map_err(OrbitError::HighScores)
    }
}
