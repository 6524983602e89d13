//! Look-ahead bot for headless runs and soak tests
//!
//! Plans a lane for each of the next few slots with the same one-lane-per-slot
//! rule the generator guarantees, then returns the single move that starts
//! along that plan.

use crate::sim::{GameState, Intent, Slot, angle_ahead};

/// Slots the bot looks ahead
pub const LOOKAHEAD_SLOTS: usize = 4;

/// Upcoming (slot, orbit) pairs in travel order
fn upcoming(state: &GameState, count: usize) -> Vec<(Slot, u32)> {
    let angle = state.runner.angle;
    let mut slot = Slot::nearest(angle);
    if angle_ahead(angle, slot.angle()) < 0.0 {
        slot = slot.next();
    }
    // Slot 0 seen from the back half of the orbit is the next orbit's
    let mut orbit = if slot.index() == 0 && angle > 180.0 {
        state.next_orbit_level
    } else {
        state.current_orbit_level
    };

    let mut plan = Vec::with_capacity(count);
    for k in 0..count {
        if k > 0 && slot.index() == 0 {
            orbit += 1;
        }
        plan.push((slot, orbit));
        slot = slot.next();
    }
    plan
}

/// Intent to issue this frame, if any
pub fn choose_intent(state: &GameState) -> Option<Intent> {
    let layout = state.geometry.layout;
    let lanes = layout.lanes();

    // safe[i]: lane i survives from this slot through the rest of the window
    let mut safe = vec![true; lanes.len()];
    for (slot, orbit) in upcoming(state, LOOKAHEAD_SLOTS).into_iter().rev() {
        safe = lanes
            .iter()
            .map(|&lane| {
                !state.is_blocked(orbit, slot, lane)
                    && lanes
                        .iter()
                        .zip(&safe)
                        .any(|(&to, &ok)| ok && layout.reachable(lane, to))
            })
            .collect();
    }

    let current = state.runner.lane;
    let is_safe = |lane| layout.index_of(lane).is_some_and(|i| safe[i]);
    if is_safe(current) {
        return None;
    }
    if layout.outward(current).is_some_and(is_safe) {
        return Some(Intent::MoveLeft);
    }
    if layout.inward(current).is_some_and(is_safe) {
        return Some(Intent::MoveRight);
    }
    log::debug!("autopilot sees no safe lane from {current:?}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Hazard, Lane, RunPhase, TickInput, tick};

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.hazards.clear();
        tick(&mut state, &TickInput::intent(Intent::Start), 0.0);
        state
    }

    #[test]
    fn test_stays_when_clear() {
        let state = playing(1);
        assert_eq!(choose_intent(&state), None);
    }

    #[test]
    fn test_dodges_inward() {
        let mut state = playing(2);
        // Just past slot 0, so slot 1 is next
        state.runner.angle = 5.0;
        state.hazards.push(Hazard::new(Slot::new(1), Lane::Outer, 0, 1));
        assert_eq!(choose_intent(&state), Some(Intent::MoveRight));
    }

    #[test]
    fn test_looks_into_next_orbit() {
        let mut state = playing(3);
        state.runner.angle = 350.0;
        state.runner.lane = Lane::Inner;
        state.hazards.push(Hazard::new(Slot::new(0), Lane::Inner, 0, 2));
        assert_eq!(choose_intent(&state), Some(Intent::MoveLeft));
    }

    #[test]
    fn test_threads_a_corridor() {
        let mut state = playing(4);
        let blocked = [
            (2, Lane::Outer),
            (3, Lane::Outer),
            (4, Lane::Middle),
            (5, Lane::Middle),
            (6, Lane::Inner),
            (7, Lane::Inner),
        ];
        for (slot, lane) in blocked {
            let mut hazard = Hazard::new(Slot::new(slot), lane, 0, 1);
            hazard.id = state.next_entity_id();
            state.hazards.push(hazard);
        }

        while state.runner.angle < 200.0 && state.phase == RunPhase::Playing {
            let input = TickInput {
                intent: choose_intent(&state),
            };
            tick(&mut state, &input, 1.0 / 60.0);
        }
        assert_eq!(state.phase, RunPhase::Playing);
        assert!(state.hazards.iter().all(|h| h.passed));
        assert_eq!(state.score, 6);
    }
}
