//! Power-up placement

use rand::Rng;
use rand::seq::IndexedRandom;

use super::lane::{Lane, LaneGeometry, Slot};
use super::state::{Hazard, PowerUp, PowerUpKind};
use crate::error::SpawnError;

/// Pick a random free (slot, lane) pair and a random kind
///
/// `blocking` holds the hazards a power-up must not share a square with
/// (the current orbit's un-passed hazards). `spawned_at_level` is left at 0
/// for the caller to stamp.
pub fn try_spawn_powerup<R: Rng + ?Sized>(
    blocking: &[&Hazard],
    geometry: &LaneGeometry,
    rng: &mut R,
) -> Result<PowerUp, SpawnError> {
    let free: Vec<(Slot, Lane)> = Slot::all()
        .flat_map(|slot| geometry.layout.lanes().iter().map(move |&lane| (slot, lane)))
        .filter(|&(slot, lane)| !blocking.iter().any(|h| h.occupies(slot, lane)))
        .collect();

    let &(slot, lane) = free.choose(rng).ok_or(SpawnError::NoAvailableSlot)?;
    let kind = *PowerUpKind::ALL
        .choose(rng)
        .ok_or(SpawnError::NoAvailableSlot)?;

    Ok(PowerUp {
        kind,
        slot,
        lane,
        collected: false,
        spawned_at_level: 0,
    })
}

/// Like [`try_spawn_powerup`], but a full field just skips this cycle
pub fn spawn_powerup<R: Rng + ?Sized>(
    blocking: &[&Hazard],
    geometry: &LaneGeometry,
    rng: &mut R,
) -> Option<PowerUp> {
    match try_spawn_powerup(blocking, geometry, rng) {
        Ok(powerup) => Some(powerup),
        Err(err) => {
            log::warn!("power-up spawn skipped: {err}");
            None
        }
    }
}
