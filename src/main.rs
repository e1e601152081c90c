//! Headless ring-world session
//!
//! Plays one scripted run without a window: walk, stand on patches to farm,
//! dash now and then, spend berries as they come in. Rendering and audio
//! output are dropped; the oracle runs offline on a worker thread.
//!
//! Usage:
//!   ring-world [config.json] [--verbose]
//! Environment:
//!   RING_WORLD_SEED  run seed (default 42)

use std::sync::mpsc;
use std::thread;

use ring_world::advisor::{self, AdvisoryResponse, OfflineAdvisor};
use ring_world::sim::{HeldKeys, UpgradeSlot};
use ring_world::{ConfigError, Game, InputEvent, RunPhase, SimConfig};

/// ~60 Hz display
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Give up after ten simulated minutes
const MAX_FRAMES: u64 = 60 * 60 * 10;
const DEFAULT_SEED: u64 = 42;

fn main() -> Result<(), ConfigError> {
    let mut verbose = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            _ => config_path = Some(arg),
        }
    }
    ring_world::logging::init(verbose);

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let seed = std::env::var("RING_WORLD_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    log::info!("Ring World (headless) starting, seed {}", seed);

    let mut game = Game::new(config, seed);
    game.start();

    let (tx, rx) = mpsc::channel::<AdvisoryResponse>();
    let mut now = 0.0;
    let mut frames = 0;
    let mut purchases = 0u32;

    while frames < MAX_FRAMES {
        let Some(handle) = game.next_frame() else {
            break;
        };

        for event in script(frames) {
            game.handle(event);
        }
        // Same as pressing 1-4 in turn: hp, damage, speed, orbital
        if game.can_afford_upgrade() {
            let key = (purchases % 4 + 1) as u8;
            if let Some(slot) = UpgradeSlot::from_number(key) {
                game.handle(InputEvent::Purchase(slot));
                purchases += 1;
            }
        }

        let Some(output) = game.on_frame(handle, now, held_keys(frames)) else {
            break;
        };
        if !output.diff.is_empty() {
            log::trace!(
                "frame {}: +{} -{} visuals",
                frames,
                output.diff.spawned.len(),
                output.diff.despawned.len()
            );
        }

        for request in game.take_advisory_requests() {
            let tx = tx.clone();
            thread::spawn(move || {
                let _ = tx.send(advisor::consult(&OfflineAdvisor, &request));
            });
        }
        while let Ok(response) = rx.try_recv() {
            game.deliver_advice(response);
        }

        if game.phase() == RunPhase::GameOver {
            break;
        }
        now += FRAME_MS;
        frames += 1;
    }
    game.stop();

    // Let the last oracle answer land
    drop(tx);
    for response in rx {
        game.deliver_advice(response);
    }

    let stats = game.stats();
    log::info!(
        "Run ended ({:?}): survived {}s, {} kills, {} shards, {} berries, {} orbitals",
        game.phase(),
        stats.seconds_survived(),
        stats.enemies_killed,
        stats.shards,
        stats.berries,
        game.upgrades().orbitals
    );
    if let Some(message) = game.advice() {
        log::info!("Oracle: {}", message);
    }
    Ok(())
}

/// One walk-and-farm cycle: walk for two seconds, then stand for seven
const CYCLE_FRAMES: u64 = 60 * 9;
const WALK_FRAMES: u64 = 120;

fn held_keys(frame: u64) -> HeldKeys {
    if frame % CYCLE_FRAMES >= WALK_FRAMES {
        return HeldKeys::default();
    }
    match (frame / CYCLE_FRAMES) % 4 {
        0 => HeldKeys { up: true, ..Default::default() },
        1 => HeldKeys { up: true, right: true, ..Default::default() },
        2 => HeldKeys { left: true, ..Default::default() },
        _ => HeldKeys { down: true, left: true, ..Default::default() },
    }
}

/// Discrete input for this frame
fn script(frame: u64) -> Vec<InputEvent> {
    let mut events = Vec::new();
    if frame == 0 {
        events.push(InputEvent::ResumeAudio);
    }
    // Dash mid-walk; dashing while standing would reset planting
    if frame % CYCLE_FRAMES == WALK_FRAMES / 2 {
        events.push(InputEvent::DashRelease);
    }
    if frame == 60 * 30 {
        events.push(InputEvent::AskForTip);
    }
    events
}
