//! Procedural hazard generation
//!
//! Whatever strategy places the hazards, the result must leave a run of lane
//! choices through all 16 slots that only ever moves one lane per slot. Every
//! level is checked with an exhaustive search before it is handed out; a
//! level that fails loses hazards from the end until it passes.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::lane::{Lane, LaneGeometry, LaneLayout, Slot};
use super::state::{Hazard, PowerUp};
use crate::consts::*;
use crate::error::GenerationError;
use crate::tuning::{GenerationStrategy, Tuning};

/// Lanes marked safe per slot, indexed by lane position in the layout
type SafeGrid = [[bool; 3]; SLOT_COUNT];

/// Deterministic seed for a calendar day, so everyone gets the same daily run
pub fn daily_seed(year: u32, month: u32, day: u32) -> u64 {
    let date = (year as u64) * 10_000 + (month as u64) * 100 + day as u64;
    // splitmix64 finalizer
    let mut z = date.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generate a level, trimming hazards if the strategy overfilled it
pub fn generate_level<R: Rng + ?Sized>(
    orbit_level: u32,
    geometry: &LaneGeometry,
    powerup: Option<&PowerUp>,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<Hazard> {
    let layout = geometry.layout;
    let mut hazards = place_hazards(orbit_level, layout, powerup, tuning, rng);
    while let Err(err) = verify_solvable(orbit_level, &hazards, layout) {
        log::warn!("{err}; dropping a hazard");
        hazards.pop();
    }
    hazards
}

/// Generate a level and report, rather than repair, an unsolvable result
pub fn try_generate_level<R: Rng + ?Sized>(
    orbit_level: u32,
    geometry: &LaneGeometry,
    powerup: Option<&PowerUp>,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<Vec<Hazard>, GenerationError> {
    let layout = geometry.layout;
    let hazards = place_hazards(orbit_level, layout, powerup, tuning, rng);
    verify_solvable(orbit_level, &hazards, layout)?;
    Ok(hazards)
}

/// Run the configured strategy without the solvability check
pub fn place_hazards<R: Rng + ?Sized>(
    orbit_level: u32,
    layout: LaneLayout,
    powerup: Option<&PowerUp>,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<Hazard> {
    let positions = match tuning.strategy {
        GenerationStrategy::SafePathFirst => safe_path_first(orbit_level, layout, powerup, tuning, rng),
        GenerationStrategy::Spaced => spaced(orbit_level, layout, powerup, tuning, rng),
    };
    positions
        .into_iter()
        .map(|(slot, lane)| {
            let color = rng.random_range(0..HAZARD_COLOR_COUNT);
            Hazard::new(slot, lane, color, orbit_level)
        })
        .collect()
}

pub fn verify_solvable(
    orbit_level: u32,
    hazards: &[Hazard],
    layout: LaneLayout,
) -> Result<(), GenerationError> {
    if find_safe_path(hazards, layout).is_some() {
        Ok(())
    } else {
        Err(GenerationError::Infeasible {
            orbit_level,
            hazards: hazards.len(),
        })
    }
}

/// One lane per slot, moving at most one lane between slots, avoiding every hazard
///
/// Forward reachability over the 16-slot graph with back-pointers, which is
/// exhaustive: a slot's reachable set is every lane some valid prefix ends in.
pub fn find_safe_path(hazards: &[Hazard], layout: LaneLayout) -> Option<Vec<Lane>> {
    let lanes = layout.lanes();
    let blocked = |slot: usize, lane: Lane| {
        hazards
            .iter()
            .any(|h| h.slot.index() == slot && h.lane == lane)
    };

    // parent[slot][lane] = lane index at slot - 1 that reached it
    let mut parent = [[None::<usize>; 3]; SLOT_COUNT];
    let mut reachable = [false; 3];
    for (i, &lane) in lanes.iter().enumerate() {
        reachable[i] = !blocked(0, lane);
    }

    for slot in 1..SLOT_COUNT {
        let mut next = [false; 3];
        for (i, &lane) in lanes.iter().enumerate() {
            if blocked(slot, lane) {
                continue;
            }
            let from = (0..lanes.len()).find(|&j| reachable[j] && j.abs_diff(i) <= 1);
            if let Some(j) = from {
                next[i] = true;
                parent[slot][i] = Some(j);
            }
        }
        if !next.iter().any(|&r| r) {
            return None;
        }
        reachable = next;
    }

    let mut index = (0..lanes.len()).find(|&i| reachable[i])?;
    let mut path = vec![lanes[index]; SLOT_COUNT];
    for slot in (1..SLOT_COUNT).rev() {
        path[slot] = lanes[index];
        index = parent[slot][index]?;
    }
    path[0] = lanes[index];
    Some(path)
}

/// Safe-path-first: walk a random safe lane around the orbit, bridge
/// dead ends, then scatter hazards over what is left.
fn safe_path_first<R: Rng + ?Sized>(
    orbit_level: u32,
    layout: LaneLayout,
    powerup: Option<&PowerUp>,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<(Slot, Lane)> {
    let lane_count = layout.count();
    let mut safe: SafeGrid = [[false; 3]; SLOT_COUNT];

    let mut primary = rng.random_range(0..lane_count);
    let mut stable_slots = 0u32;
    let choice_chance = tuning.choice_chance(orbit_level);

    for row in safe.iter_mut() {
        row[primary] = true;

        // Sometimes offer a second lane next to the primary one
        if rng.random_bool(choice_chance) {
            if let Some(&extra) = adjacent_indices(primary, lane_count).choose(rng) {
                row[extra] = true;
            }
        }

        let forced = stable_slots >= tuning.max_stable_slots;
        if forced || rng.random_bool(tuning.lane_change_chance) {
            if let Some(&next) = adjacent_indices(primary, lane_count).choose(rng) {
                primary = next;
            }
            stable_slots = 0;
        } else {
            stable_slots += 1;
        }
    }

    bridge_dead_ends(&mut safe, lane_count);

    let mut candidates: Vec<(Slot, Lane)> = Vec::new();
    for slot in Slot::all() {
        if in_tutorial_zone(orbit_level, slot, tuning) {
            continue;
        }
        for (i, &lane) in layout.lanes().iter().enumerate() {
            if safe[slot.index()][i] {
                continue;
            }
            if powerup.is_some_and(|p| p.occupies(slot, lane)) {
                continue;
            }
            candidates.push((slot, lane));
        }
    }

    let capacity = SLOT_COUNT * (lane_count - 1);
    let target = (capacity as f32 * tuning.density_for_level(orbit_level)).floor() as usize;

    // Shuffle-then-take spreads hazards evenly instead of clustering them
    candidates.shuffle(rng);
    candidates.truncate(target);
    candidates
}

/// Every safe lane must reach a safe lane in the next slot (wrapping 16 -> 1)
fn bridge_dead_ends(safe: &mut SafeGrid, lane_count: usize) {
    loop {
        let mut changed = false;
        for slot in 0..SLOT_COUNT {
            let next = (slot + 1) % SLOT_COUNT;
            for lane in 0..lane_count {
                if !safe[slot][lane] {
                    continue;
                }
                let reaches = (0..lane_count).any(|to| safe[next][to] && to.abs_diff(lane) <= 1);
                if !reaches {
                    // The middle lane is one step from every other lane
                    safe[next][lane_count / 2] = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Spaced: hazard count grows with level, slots keep a minimum gap that
/// tightens over time, and no lane takes three hazards in a row.
fn spaced<R: Rng + ?Sized>(
    orbit_level: u32,
    layout: LaneLayout,
    powerup: Option<&PowerUp>,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<(Slot, Lane)> {
    let steps = orbit_level.saturating_sub(1);
    let tighten = (steps / tuning.spaced_tighten_every.max(1)) as usize;
    let spacing = tuning
        .spaced_start_spacing
        .saturating_sub(tighten)
        .max(tuning.spaced_min_spacing)
        .max(1);
    let wanted = tuning.spaced_base_hazards + (steps as f32 * tuning.spaced_hazards_per_level) as usize;
    let wanted = wanted.min(SLOT_COUNT / spacing);

    let mut open: Vec<Slot> = Slot::all()
        .filter(|&slot| !in_tutorial_zone(orbit_level, slot, tuning))
        .collect();
    open.shuffle(rng);

    let mut chosen: Vec<Slot> = Vec::with_capacity(wanted);
    for slot in open {
        if chosen.len() >= wanted {
            break;
        }
        if chosen.iter().all(|c| slot_distance(*c, slot) >= spacing) {
            chosen.push(slot);
        }
    }
    chosen.sort();

    let mut placed: Vec<(Slot, Lane)> = Vec::with_capacity(chosen.len());
    for slot in chosen {
        let streak_lane = match placed.as_slice() {
            [.., (_, a), (_, b)] if a == b => Some(*a),
            _ => None,
        };
        let options: Vec<Lane> = layout
            .lanes()
            .iter()
            .copied()
            .filter(|&lane| Some(lane) != streak_lane)
            .filter(|&lane| !powerup.is_some_and(|p| p.occupies(slot, lane)))
            .collect();
        if let Some(&lane) = options.choose(rng) {
            placed.push((slot, lane));
        }
    }

    // Some lane must stay enterable; otherwise shed the newest hazard
    while !placed.is_empty() && !has_enterable_gap(&placed, layout, tuning.min_enterable_gap_deg) {
        placed.pop();
    }
    placed
}

/// Widest hazard-free arc in any lane reaches `min_gap_deg`
fn has_enterable_gap(placed: &[(Slot, Lane)], layout: LaneLayout, min_gap_deg: f32) -> bool {
    layout.lanes().iter().any(|&lane| {
        let mut slots: Vec<usize> = placed
            .iter()
            .filter(|(_, l)| *l == lane)
            .map(|(s, _)| s.index())
            .collect();
        if slots.len() <= 1 {
            return true;
        }
        slots.sort_unstable();
        let widest = slots
            .iter()
            .zip(slots.iter().cycle().skip(1))
            .map(|(&a, &b)| (b + SLOT_COUNT - a) % SLOT_COUNT)
            .max()
            .unwrap_or(SLOT_COUNT);
        widest as f32 * SLOT_SPACING_DEG >= min_gap_deg
    })
}

fn in_tutorial_zone(orbit_level: u32, slot: Slot, tuning: &Tuning) -> bool {
    orbit_level == tuning.tutorial_level && slot.angle() < tuning.tutorial_clear_deg
}

/// Slots one lane away from `index`
fn adjacent_indices(index: usize, lane_count: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(2);
    if index > 0 {
        out.push(index - 1);
    }
    if index + 1 < lane_count {
        out.push(index + 1);
    }
    out
}

/// Circular distance between two slots
fn slot_distance(a: Slot, b: Slot) -> usize {
    let d = a.index().abs_diff(b.index());
    d.min(SLOT_COUNT - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PowerUpKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn geometry(layout: LaneLayout) -> LaneGeometry {
        LaneGeometry::from_outer_radius(300.0, layout, 0.6)
    }

    #[test]
    fn test_safe_path_first_is_solvable() {
        let tuning = Tuning::default();
        let geo = geometry(LaneLayout::Three);
        for seed in 0..200 {
            let mut rng = Pcg32::seed_from_u64(seed);
            for level in [1, 2, 6, 12, 20, 50] {
                let hazards = try_generate_level(level, &geo, None, &tuning, &mut rng)
                    .expect("safe-path levels are always solvable");
                assert!(hazards.iter().all(|h| h.orbit_level == level));
                assert!(hazards.iter().all(|h| !h.passed && !h.spawned));
            }
        }
    }

    #[test]
    fn test_hazard_count_follows_density() {
        let tuning = Tuning::default();
        let geo = geometry(LaneLayout::Three);
        let mut rng = Pcg32::seed_from_u64(99);
        // 16 slots * 2 non-primary lanes = 32 capacity
        assert!(generate_level(2, &geo, None, &tuning, &mut rng).len() <= 8);
        assert!(generate_level(10, &geo, None, &tuning, &mut rng).len() <= 11);
        assert!(generate_level(30, &geo, None, &tuning, &mut rng).len() <= 14);
    }

    #[test]
    fn test_no_stacked_hazards() {
        let tuning = Tuning::default();
        let geo = geometry(LaneLayout::Three);
        let mut rng = Pcg32::seed_from_u64(5);
        for level in 1..40 {
            let hazards = generate_level(level, &geo, None, &tuning, &mut rng);
            for (i, a) in hazards.iter().enumerate() {
                for b in &hazards[i + 1..] {
                    assert!(!a.occupies(b.slot, b.lane), "duplicate at level {level}");
                }
            }
        }
    }

    #[test]
    fn test_tutorial_quarter_is_clear() {
        let tuning = Tuning::default();
        let geo = geometry(LaneLayout::Three);
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let hazards = generate_level(1, &geo, None, &tuning, &mut rng);
            assert!(hazards.iter().all(|h| h.angle() >= 90.0));
        }
    }

    #[test]
    fn test_powerup_square_excluded() {
        let tuning = Tuning::default();
        let geo = geometry(LaneLayout::Three);
        let powerup = PowerUp {
            kind: PowerUpKind::SlowTime,
            slot: Slot::new(8),
            lane: Lane::Inner,
            collected: false,
            spawned_at_level: 3,
        };
        for seed in 0..100 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let hazards = generate_level(20, &geo, Some(&powerup), &tuning, &mut rng);
            assert!(!hazards.iter().any(|h| h.occupies(Slot::new(8), Lane::Inner)));
        }
    }

    #[test]
    fn test_spaced_strategy_respects_rules() {
        let tuning = Tuning {
            strategy: GenerationStrategy::Spaced,
            ..Tuning::default()
        };
        let geo = geometry(LaneLayout::Three);
        for seed in 0..100 {
            let mut rng = Pcg32::seed_from_u64(seed);
            for level in [1, 4, 9, 25] {
                let hazards = try_generate_level(level, &geo, None, &tuning, &mut rng)
                    .expect("spaced levels stay solvable");
                // At most one hazard per slot, no three in a row in one lane
                let mut slots: Vec<usize> = hazards.iter().map(|h| h.slot.index()).collect();
                slots.dedup();
                assert_eq!(slots.len(), hazards.len());
                for w in hazards.windows(3) {
                    assert!(!(w[0].lane == w[1].lane && w[1].lane == w[2].lane));
                }
            }
        }
    }

    #[test]
    fn test_two_lane_layout_solvable() {
        let tuning = Tuning::two_lane();
        let geo = geometry(LaneLayout::Two);
        for seed in 0..100 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let hazards = try_generate_level(30, &geo, None, &tuning, &mut rng)
                .expect("two-lane levels are solvable");
            assert!(hazards.iter().all(|h| h.lane != Lane::Middle));
        }
    }

    #[test]
    fn test_find_safe_path_rejects_wall() {
        // Slot 5 fully blocked
        let hazards: Vec<Hazard> = [Lane::Inner, Lane::Middle, Lane::Outer]
            .into_iter()
            .map(|lane| Hazard::new(Slot::new(5), lane, 0, 3))
            .collect();
        assert!(find_safe_path(&hazards, LaneLayout::Three).is_none());
        assert!(verify_solvable(3, &hazards, LaneLayout::Three).is_err());
    }

    #[test]
    fn test_find_safe_path_rejects_lane_skip() {
        // Only inner free at slot 3, only outer free at slot 4
        let hazards = vec![
            Hazard::new(Slot::new(3), Lane::Middle, 0, 3),
            Hazard::new(Slot::new(3), Lane::Outer, 0, 3),
            Hazard::new(Slot::new(4), Lane::Inner, 0, 3),
            Hazard::new(Slot::new(4), Lane::Middle, 0, 3),
        ];
        assert!(find_safe_path(&hazards, LaneLayout::Three).is_none());
    }

    #[test]
    fn test_find_safe_path_steps_one_lane() {
        let hazards = vec![
            Hazard::new(Slot::new(2), Lane::Outer, 0, 3),
            Hazard::new(Slot::new(2), Lane::Middle, 0, 3),
            Hazard::new(Slot::new(6), Lane::Inner, 0, 3),
            Hazard::new(Slot::new(6), Lane::Middle, 0, 3),
        ];
        let path = find_safe_path(&hazards, LaneLayout::Three).expect("path exists");
        assert_eq!(path[2], Lane::Inner);
        assert_eq!(path[6], Lane::Outer);
        let layout = LaneLayout::Three;
        assert!(path.windows(2).all(|w| layout.reachable(w[0], w[1])));
        for h in &hazards {
            assert_ne!(path[h.slot.index()], h.lane);
        }
    }

    #[test]
    fn test_generate_level_repairs_overfill() {
        // Density 1.0 with no choice lanes still has the primary path free
        let tuning = Tuning {
            density_early: 1.0,
            density_mid: 1.0,
            density_late: 1.0,
            choice_chance_early: 0.0,
            choice_chance_late: 0.0,
            ..Tuning::default()
        };
        let geo = geometry(LaneLayout::Three);
        let mut rng = Pcg32::seed_from_u64(8);
        let hazards = generate_level(7, &geo, None, &tuning, &mut rng);
        assert!(find_safe_path(&hazards, LaneLayout::Three).is_some());
        assert!(hazards.len() >= SLOT_COUNT);
    }

    #[test]
    fn test_daily_seed_stable() {
        assert_eq!(daily_seed(2026, 10, 19), daily_seed(2026, 10, 19));
        assert_ne!(daily_seed(2026, 10, 19), daily_seed(2026, 10, 20));
    }

    #[test]
    fn test_same_seed_same_level() {
        let tuning = Tuning::default();
        let geo = geometry(LaneLayout::Three);
        let a = generate_level(9, &geo, None, &tuning, &mut Pcg32::seed_from_u64(123));
        let b = generate_level(9, &geo, None, &tuning, &mut Pcg32::seed_from_u64(123));
        assert_eq!(a, b);
    }
}
