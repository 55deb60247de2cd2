//! NeoArcadia headless driver
//!
//! Builds the arcade hall, lets the autoplay bot play every cabinet for a
//! while, and prints the finished rounds as JSON.

use std::path::PathBuf;

use clap::Parser;

use neo_arcadia::consts::SIM_DT;
use neo_arcadia::platform::HeadlessHost;
use neo_arcadia::sim::GameEvent;
use neo_arcadia::{Arcade, Tuning};

#[derive(Debug, Parser)]
#[command(name = "neo-arcadia", about = "Run the NeoArcadia hall headless with autoplay")]
struct Args {
    /// Scene seed; every cabinet derives its own stream from it
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 300.0)]
    seconds: f32,

    /// Tuning JSON file (defaults are used when missing or invalid)
    #[arg(long)]
    tuning: Option<PathBuf>,
}

fn load_tuning(path: Option<&PathBuf>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    let (tuning, error) = Tuning::load_or_default(path);
    if let Some(error) = error {
        log::warn!("Using default tuning: {}", error);
    }
    for warning in tuning.validate() {
        log::warn!("Tuning: {}", warning);
    }
    tuning
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("NeoArcadia (headless) starting with seed {}", args.seed);

    let tuning = load_tuning(args.tuning.as_ref());
    let mut arcade = Arcade::neo_arcadia(&tuning, args.seed).with_autoplay(true);
    let mut host = HeadlessHost::new();
    arcade.sync_all(&mut host);

    let ticks = (args.seconds.max(0.0) / SIM_DT).ceil() as u64;
    for _ in 0..ticks {
        for event in arcade.tick(SIM_DT, &mut host) {
            match event {
                GameEvent::GameOver {
                    instance,
                    kind,
                    winner,
                    score,
                } => {
                    log::info!(
                        "{} {:?} finished: winner {:?}, score {}",
                        kind.as_str(),
                        instance,
                        winner,
                        score
                    );
                }
                GameEvent::DifficultyUp { instance, level } => {
                    log::debug!("{:?} difficulty {}", instance, level);
                }
                _ => {}
            }
        }
    }

    log::info!(
        "Ran {} ticks: {} rounds finished, {} effects applied, {} sounds played",
        arcade.ticks(),
        arcade.rounds().len(),
        host.effects_applied,
        host.sounds_played
    );
    match serde_json::to_string_pretty(arcade.rounds()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize round results: {}", e),
    }
}
