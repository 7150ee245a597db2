//! Headless demo driver
//!
//! Loads a level set, generates and validates the first level, and runs the
//! simulation for a fixed number of frames, logging the sounds a real
//! frontend would have played. Usage:
//!
//! ```text
//! treads <levels.json> [seed] [frames]
//! ```

use std::collections::BTreeMap;
use std::process::ExitCode;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use treads::{load_level_set, EventMask, Impulse, LevelState, MonsterFlags};

/// Event bit -> sound resource, mirroring the frontend's lookup table.
/// Events without an entry (e.g. MonsterCreated) are silently ignored.
const EVENT_SOUNDS: &[(EventMask, &str)] = &[
    (EventMask::BLOCK_PUSHED, "push.wav"),
    (EventMask::MONSTER_SQUISHED, "squish_monster.wav"),
    (EventMask::MONSTER_KILLED, "squish_monster.wav"),
    (EventMask::PLAYER_KILLED, "squish_player.wav"),
    (EventMask::BONUS_COLLECTED, "crush_bonus.wav"),
    (EventMask::BLOCK_DESTROYED, "crush_block.wav"),
    (EventMask::BLOCK_BOUNCED, "block_bounce.wav"),
    (EventMask::EXPLOSION, "explode.wav"),
    (EventMask::BLOCK_STOPPED, "block_stop.wav"),
    (EventMask::PLAYER_SQUISHED, "squish_player.wav"),
    (EventMask::LIFE_COLLECTED, "extra_life.wav"),
];

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: treads <levels.json> [seed] [frames]")?;
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);
    let frames: i64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(3600);

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut all_params = load_level_set(&path)?;
    treads::levels::prepare(&mut all_params[0], &mut rng)?;

    let mut level = LevelState::generate(&all_params[0], &mut rng)?;
    level.validate()?;
    log::info!(
        "level '{}': {} monsters, {} blocks",
        level.params().name,
        level.monsters().len(),
        level.blocks().len()
    );

    let mut player_score = 0i64;
    let mut player_lives = 3i64;
    let mut sound_counts: BTreeMap<&str, u64> = BTreeMap::new();

    for frame in 0..frames {
        // a real frontend aggregates held keys here; the demo player just
        // stands its ground
        let events = level.exec_frame(Impulse::empty(), &mut rng);

        for (event, sound) in EVENT_SOUNDS {
            if events.events.contains(*event) {
                log::debug!("frame {frame}: play {sound}");
                *sound_counts.entry(sound).or_default() += 1;
            }
        }

        for score in &events.scores {
            if score.monster == Some(level.player_id()) {
                player_score += score.points;
                player_lives += score.lives;
            }
        }

        // level complete once every non-player monster is gone
        let remaining =
            level.count_monsters_with_flags(MonsterFlags::empty(), MonsterFlags::IS_PLAYER);
        if remaining == 0 || !level.player().is_alive() {
            log::info!("run over after {} frames", level.frames_executed());
            break;
        }
    }

    println!(
        "frames={} score={} lives={} player_alive={}",
        level.frames_executed(),
        player_score,
        player_lives,
        level.player().is_alive()
    );
    for (sound, count) in &sound_counts {
        println!("  {sound} x{count}");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
