//! Level-definition file loading
//!
//! A level set is a JSON file with a `defaults` object and a `levels` array
//! of per-level overrides. Numeric counts may be given either as a single
//! integer or as an inclusive `[low, high]` pair sampled at generation time.
//! Widths, heights, and the player spawn are specified in grid cells and
//! multiplied by `grid_pitch` here; a level without a `block_map` gets a
//! freshly generated maze each time it is prepared.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand_pcg::Pcg32;
use serde::Deserialize;

use crate::maze::generate_maze;
use crate::sim::{BlockSpecial, GenerationParameters, LevelError, SpecialCountRange};

#[derive(Debug, Deserialize)]
struct LevelFile {
    defaults: Defaults,
    levels: Vec<LevelDef>,
}

/// Baseline values every level starts from. All fields are required; a
/// missing one is a parse error surfaced at load time.
#[derive(Debug, Deserialize)]
struct Defaults {
    grid_pitch: i64,
    width: i64,
    height: i64,
    player_x: i64,
    player_y: i64,
    player_squishable: bool,
    basic_monster_count: SpecialCountRange,
    power_monster_count: SpecialCountRange,
    power_monsters_can_push: bool,
    player_move_speed: i64,
    basic_monster_move_speed: i64,
    power_monster_move_speed: i64,
    push_speed: i64,
    bomb_speed: i64,
    bounce_speed_absorption: i64,
    block_destroy_rate: f32,
    #[serde(default)]
    special_counts: BTreeMap<BlockSpecial, SpecialCountRange>,
}

/// One level's overrides; anything absent falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
struct LevelDef {
    #[serde(default)]
    name: String,
    grid_pitch: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
    player_x: Option<i64>,
    player_y: Option<i64>,
    player_squishable: Option<bool>,
    basic_monster_count: Option<SpecialCountRange>,
    power_monster_count: Option<SpecialCountRange>,
    power_monsters_can_push: Option<bool>,
    player_move_speed: Option<i64>,
    basic_monster_move_speed: Option<i64>,
    power_monster_move_speed: Option<i64>,
    push_speed: Option<i64>,
    bomb_speed: Option<i64>,
    bounce_speed_absorption: Option<i64>,
    block_destroy_rate: Option<f32>,
    special_counts: Option<BTreeMap<BlockSpecial, SpecialCountRange>>,
    /// Optional fixed occupancy grid (row-major, one entry per cell). When
    /// absent, a maze is generated by `prepare` instead.
    block_map: Option<Vec<bool>>,
}

impl LevelDef {
    fn resolve(self, defaults: &Defaults) -> GenerationParameters {
        let grid_pitch = self.grid_pitch.unwrap_or(defaults.grid_pitch);
        // cell-denominated values become world units here
        GenerationParameters {
            name: self.name,
            grid_pitch,
            w: self.width.unwrap_or(defaults.width) * grid_pitch,
            h: self.height.unwrap_or(defaults.height) * grid_pitch,
            player_x: self.player_x.unwrap_or(defaults.player_x) * grid_pitch,
            player_y: self.player_y.unwrap_or(defaults.player_y) * grid_pitch,
            player_squishable: self
                .player_squishable
                .unwrap_or(defaults.player_squishable),
            block_map: self.block_map.unwrap_or_default(),
            special_counts: self
                .special_counts
                .unwrap_or_else(|| defaults.special_counts.clone()),
            basic_monster_count: self
                .basic_monster_count
                .unwrap_or(defaults.basic_monster_count)
                .bounds(),
            power_monster_count: self
                .power_monster_count
                .unwrap_or(defaults.power_monster_count)
                .bounds(),
            power_monsters_can_push: self
                .power_monsters_can_push
                .unwrap_or(defaults.power_monsters_can_push),
            player_move_speed: self.player_move_speed.unwrap_or(defaults.player_move_speed),
            basic_monster_move_speed: self
                .basic_monster_move_speed
                .unwrap_or(defaults.basic_monster_move_speed),
            power_monster_move_speed: self
                .power_monster_move_speed
                .unwrap_or(defaults.power_monster_move_speed),
            push_speed: self.push_speed.unwrap_or(defaults.push_speed),
            bomb_speed: self.bomb_speed.unwrap_or(defaults.bomb_speed),
            bounce_speed_absorption: self
                .bounce_speed_absorption
                .unwrap_or(defaults.bounce_speed_absorption),
            block_destroy_rate: self.block_destroy_rate.unwrap_or(defaults.block_destroy_rate),
        }
    }
}

/// Parse a level set from JSON text.
pub fn parse_level_set(text: &str) -> Result<Vec<GenerationParameters>, LevelError> {
    let file: LevelFile = serde_json::from_str(text)?;
    if file.levels.is_empty() {
        return Err(LevelError::EmptyLevelSet);
    }
    Ok(file
        .levels
        .into_iter()
        .map(|level| level.resolve(&file.defaults))
        .collect())
}

/// Load a level set from a JSON file.
pub fn load_level_set(path: impl AsRef<Path>) -> Result<Vec<GenerationParameters>, LevelError> {
    let path = path.as_ref();
    let params = parse_level_set(&fs::read_to_string(path)?)?;
    log::info!("loaded {} levels from {}", params.len(), path.display());
    Ok(params)
}

/// Fill in the randomized portions of a level description before handing it
/// to `LevelState::generate`: levels without a fixed block map get a fresh
/// maze. Call this again to reroll the same level after a death.
pub fn prepare(params: &mut GenerationParameters, rng: &mut Pcg32) -> Result<(), LevelError> {
    if params.block_map.is_empty() {
        params.block_map = generate_maze(
            params.w / params.grid_pitch,
            params.h / params.grid_pitch,
            rng,
        )?;
    }
    Ok(())
}
