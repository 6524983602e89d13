//! Orbit Runner headless entry point
//!
//! Plays runs with the look-ahead autopilot on a fixed timestep and logs the
//! outcome. Useful as a soak test for generation and progression.
//!
//! Usage: `orbit-runner [SEED | daily:YYYY-MM-DD] [--tuning FILE] [--runs N] [--seconds S]`

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use orbit_runner::autopilot::choose_intent;
use orbit_runner::highscores::HighScores;
use orbit_runner::sim::{GameEvent, GameState, LaneGeometry, TickInput, daily_seed, tick};
use orbit_runner::sim::{DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH, Intent};
use orbit_runner::{DeviceClass, OrbitError, Tuning};

/// Display refresh the demo pretends to run at
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "orbit-runner")]
#[command(about = "Headless Orbit Runner: autopilot runs on a fixed timestep")]
struct Options {
    /// Run seed, either a number or `daily:YYYY-MM-DD`. Defaults to the clock.
    #[arg(value_name = "SEED", value_parser = parse_seed)]
    seed: Option<u64>,
    /// JSON tuning override; missing keys keep their defaults
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    #[arg(long, default_value_t = 3)]
    runs: u32,
    /// Time limit per run
    #[arg(long, value_name = "SECONDS", default_value_t = 120.0)]
    seconds: f32,
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

fn parse_seed(raw: &str) -> Result<u64, String> {
    let Some(date) = raw.strip_prefix("daily:") else {
        return raw
            .parse()
            .map_err(|_| format!("expected a number or daily:YYYY-MM-DD, got {raw:?}"));
    };
    let mut parts = date.split('-').map(|p| p.parse::<u32>().ok());
    match (parts.next().flatten(), parts.next().flatten(), parts.next().flatten(), parts.next()) {
        (Some(year), Some(month @ 1..=12), Some(day @ 1..=31), None) => {
            Ok(daily_seed(year, month, day))
        }
        _ => Err(format!("bad daily date {date:?}, expected YYYY-MM-DD")),
    }
}

fn run(options: Options) -> Result<(), OrbitError> {
    let tuning = match &options.tuning {
        Some(path) => Tuning::from_file(path)?,
        None => Tuning::default(),
    };
    let seed = options.seed.unwrap_or_else(|| now_ms() as u64);

    let geometry = LaneGeometry::for_viewport(
        DEFAULT_FIELD_WIDTH,
        DEFAULT_FIELD_HEIGHT,
        DeviceClass::Desktop,
        &tuning,
    );
    let mut state = GameState::with_config(seed, tuning, geometry)?;
    let mut scores = HighScores::new();
    let max_frames = (options.seconds / FRAME_DT) as u32;

    log::info!(
        "Orbit Runner (headless) seed {} lanes {}",
        seed,
        state.geometry.layout.count()
    );

    for run_index in 0..options.runs {
        if run_index > 0 {
            state.reset();
        }
        tick(&mut state, &TickInput::intent(Intent::Start), 0.0);

        let mut collected = 0u32;
        let mut frames = 0u32;
        let mut ended = false;
        while frames < max_frames && !ended {
            let input = TickInput {
                intent: choose_intent(&state),
            };
            let result = tick(&mut state, &input, FRAME_DT);
            collected += result
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::PowerUpCollected { .. }))
                .count() as u32;
            ended = result.game_over;
            frames += 1;
        }

        let secs = frames as f32 * FRAME_DT;
        if ended {
            log::info!(
                "run {}: crashed at level {} after {secs:.1}s, score {}, {collected} power-ups",
                run_index + 1,
                state.level,
                state.score
            );
            scores.record_run(&state, now_ms());
        } else {
            log::info!(
                "run {}: survived {secs:.1}s, level {}, score {}, {collected} power-ups",
                run_index + 1,
                state.level,
                state.score
            );
            // Time limit counts as a finished run
            scores.add_score(state.score, state.level, state.seed, now_ms());
        }
    }

    println!("{}", scores.to_json()?);
    if let Some(best) = scores.top_score() {
        log::info!("best score {best}");
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let options = Options::parse();
    if let Err(e) = run(options) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
