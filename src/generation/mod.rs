//! # Generation Module
//!
//! Procedural content generation for grids, encounters and items.
//!
//! Every generator implements [`Generator`] and draws from a seeded
//! [`StdRng`], so a seed fully determines a session's starting layout.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::config;
use crate::{BrambleError, BrambleResult, GameRules, Grid, Position, TrapDamage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for procedural generation.
///
/// Controls grid dimensions, tile densities and the fog-of-war policy the
/// generated grid starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    /// Chance for an interior tile to become a wall (0.0 to 1.0)
    pub wall_chance: f64,
    /// Chance for an interior tile to become a trap (0.0 to 1.0)
    pub trap_chance: f64,
    pub trap_damage: TrapDamage,
    pub walls_always_visible: bool,
    pub reveal_all: bool,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(12345);
    /// assert_eq!(config.seed, 12345);
    /// assert!(config.width >= bramble::config::MIN_GRID_SIZE);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_GRID_WIDTH,
            height: config::DEFAULT_GRID_HEIGHT,
            wall_chance: config::DEFAULT_WALL_CHANCE,
            trap_chance: config::DEFAULT_TRAP_CHANCE,
            trap_damage: TrapDamage::Flat(10),
            walls_always_visible: true,
            reveal_all: false,
        }
    }

    /// Creates a configuration for testing: the smallest grid, fully revealed.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: config::MIN_GRID_SIZE,
            height: config::MIN_GRID_SIZE,
            reveal_all: true,
            ..Self::new(seed)
        }
    }

    /// Takes the grid-related knobs out of a rule set.
    pub fn from_rules(rules: &GameRules, seed: u64) -> Self {
        Self {
            seed,
            width: rules.grid_width,
            height: rules.grid_height,
            wall_chance: rules.wall_chance,
            trap_chance: rules.trap_chance,
            trap_damage: TrapDamage::from_rules(rules.trap_damage, rules.trap_damage_is_percent),
            walls_always_visible: rules.walls_always_visible,
            reveal_all: rules.reveal_all_tiles,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// All generation systems implement this trait, giving the simulation one
/// consistent way to build and check content.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> BrambleResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> BrambleResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Free spawnable positions, excluding `occupied` and anything closer
    /// than `keep_away.1` tiles to `keep_away.0`.
    pub fn free_spawn_positions(
        grid: &Grid,
        occupied: &HashSet<Position>,
        keep_away: Option<(Position, i32)>,
    ) -> Vec<Position> {
        grid.spawnable_positions()
            .into_iter()
            .filter(|pos| !occupied.contains(pos))
            .filter(|pos| match keep_away {
                Some((center, distance)) => {
                    pos.distance_squared(center) >= (distance as i64) * (distance as i64)
                }
                None => true,
            })
            .collect()
    }

    /// Validates that a grid meets basic requirements.
    pub fn validate_grid(grid: &Grid) -> BrambleResult<()> {
        if grid.spawnable_positions().is_empty() {
            return Err(BrambleError::InvalidGrid(
                "grid has no spawnable tiles".to_string(),
            ));
        }
        Ok(())
    }
}
