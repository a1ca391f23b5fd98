//! Apple Adventure headless runner
//!
//! Generates a level, drives the simulation with a scripted input and reports
//! what happened. Usage: `apple-adventure [level] [seed] [seconds]`.
//! Settings are read from the JSON file named by `APPLE_ADVENTURE_SETTINGS`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use apple_adventure::audio::{AudioMixer, LogAudio};
    use apple_adventure::persistence::{
        MemoryStore, OFFLINE_SAVE_KEY, ProgressStore, SavedProgress, load_upgrades,
    };
    use apple_adventure::progression::{Purchase, level_reward};
    use apple_adventure::resources::KindHandles;
    use apple_adventure::sim::{LogHost, SessionStatus, Simulation, TickInput};
    use apple_adventure::Settings;
    use glam::Vec2;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let level: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(1).max(1);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(0xA991E);
    let seconds: f32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(20.0);

    let settings = match std::env::var("APPLE_ADVENTURE_SETTINGS") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Settings::from_json(&json),
            Err(e) => {
                log::warn!("Could not read settings from {}: {}", path, e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    };

    let mut store = MemoryStore::new();
    let upgrades = load_upgrades(&store, OFFLINE_SAVE_KEY);

    log::info!("Apple Adventure (headless) level {} seed {:#x}", level, seed);

    let audio = AudioMixer::from_settings(LogAudio, &settings);
    let mut sim = Simulation::new(
        level,
        upgrades,
        settings,
        &mut KindHandles,
        seed,
        audio,
        LogHost,
    );

    const FRAME: f32 = 1.0 / 60.0;
    let frames = (seconds.max(0.0) / FRAME) as u64;
    let mut ended = None;
    for frame in 0..frames {
        // Walk forward, hop regularly and pound every few jumps
        let input = TickInput {
            movement: Vec2::new((frame as f32 * 0.02).sin() * 0.3, 1.0),
            jump: frame % 45 < 5,
            ground_pound: frame % 180 == 30,
            pause: false,
        };
        let result = sim.step(FRAME, &input);
        if let Some(status) = result.session_end {
            ended = Some(status);
            break;
        }
    }

    let state = sim.state();
    println!(
        "level {} ({}): score {}/{}, lives {}, phase {:?}",
        state.level,
        state.theme.short_name(),
        state.player.score,
        state.num_apples,
        state.player.lives,
        state.phase
    );
    if let Some((health, max)) = state.boss_health() {
        println!("boss health {}/{}", health, max);
    }

    if ended == Some(SessionStatus::LevelComplete) {
        let mut progress = SavedProgress {
            upgrades,
            ..Default::default()
        };
        progress.upgrade_points += u64::from(level_reward(level));
        progress.current_level = level + 1;
        let saved = store
            .save(OFFLINE_SAVE_KEY, &progress)
            .and_then(|_| store.submit_rank(OFFLINE_SAVE_KEY, progress.current_level));
        match saved {
            Ok(()) => println!("earned {} upgrade points", level_reward(level)),
            Err(e) => log::error!("Failed to save progress: {}", e),
        }
        for item in Purchase::ALL {
            match upgrades.price(item) {
                Ok(cost) if cost <= progress.upgrade_points => {
                    println!("  can buy {:?} ({})", item, cost)
                }
                Ok(cost) => println!("  {:?} costs {}", item, cost),
                Err(e) => println!("  {}", e),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the embedding page on the web
}
