//! # Grid Generation
//!
//! Scatter generation: a walled arena with walls and traps sprinkled over
//! the interior from a uniform random source.

use crate::{
    config, BrambleError, BrambleResult, GenerationConfig, Generator, Grid, Position, Tile,
    TileKind,
};
use log::debug;
use rand::{rngs::StdRng, Rng};

/// Primary grid generator.
///
/// This generator creates grids by:
/// 1. Filling the outer ring with walls
/// 2. Rolling once per interior tile: wall, then trap, else empty
/// 3. Applying the configured fog-of-war policy
#[derive(Debug, Clone, Default)]
pub struct ScatterGridGenerator;

impl ScatterGridGenerator {
    /// Creates a new grid generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{GenerationConfig, Generator, ScatterGridGenerator};
    ///
    /// let generator = ScatterGridGenerator::new();
    /// let config = GenerationConfig::for_testing(3);
    /// let mut rng = bramble::generation::utils::create_rng(&config);
    /// let grid = generator.generate(&config, &mut rng).unwrap();
    /// assert_eq!(grid.size(), (config.width, config.height));
    /// ```
    pub fn new() -> Self {
        Self
    }

    fn interior_kind(config: &GenerationConfig, rng: &mut StdRng) -> TileKind {
        let roll: f64 = rng.gen();
        if roll < config.wall_chance {
            TileKind::Wall
        } else if roll < config.wall_chance + config.trap_chance {
            TileKind::Trap {
                damage: config.trap_damage,
            }
        } else {
            TileKind::Empty
        }
    }
}

impl Generator<Grid> for ScatterGridGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> BrambleResult<Grid> {
        if config.width < config::MIN_GRID_SIZE || config.height < config::MIN_GRID_SIZE {
            return Err(BrambleError::InvalidGrid(format!(
                "grid must be at least {0}x{0}, got {1}x{2}",
                config::MIN_GRID_SIZE,
                config.width,
                config.height
            )));
        }

        let mut grid = Grid::filled(config.width, config.height, TileKind::Wall)?;
        for y in 1..config.height as i32 - 1 {
            for x in 1..config.width as i32 - 1 {
                let kind = Self::interior_kind(config, rng);
                grid.set_tile(Position::new(x, y), Tile::new(kind));
            }
        }
        grid.set_visibility_policy(config.walls_always_visible, config.reveal_all);

        self.validate(&grid, config)?;
        debug!(
            "{} built a {}x{} grid from seed {}",
            self.generator_type(),
            config.width,
            config.height,
            config.seed
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid, config: &GenerationConfig) -> BrambleResult<()> {
        if grid.size() != (config.width, config.height) {
            return Err(BrambleError::InvalidGrid(
                "generated grid does not match the configured size".to_string(),
            ));
        }
        if let Some(pos) = grid
            .positions()
            .find(|&pos| grid.is_edge(pos) && !grid.tile_at(pos).map(Tile::is_wall).unwrap_or(false))
        {
            return Err(BrambleError::InvalidGrid(format!(
                "edge tile {} is not a wall",
                pos
            )));
        }
        crate::generation::utils::validate_grid(grid)
    }

    fn generator_type(&self) -> &'static str {
        "ScatterGridGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;

    #[test]
    fn test_edges_are_walls() {
        let config = GenerationConfig::for_testing(12345);
        let mut rng = utils::create_rng(&config);
        let grid = ScatterGridGenerator::new().generate(&config, &mut rng).unwrap();

        for pos in grid.positions() {
            if grid.is_edge(pos) {
                assert!(grid.tile_at(pos).unwrap().is_wall(), "edge {} open", pos);
            }
        }
    }

    #[test]
    fn test_too_small_is_rejected() {
        let config = GenerationConfig {
            width: 9,
            ..GenerationConfig::for_testing(1)
        };
        let mut rng = utils::create_rng(&config);
        let result = ScatterGridGenerator::new().generate(&config, &mut rng);
        assert!(matches!(result, Err(BrambleError::InvalidGrid(_))));
    }

    #[test]
    fn test_same_seed_same_grid() {
        let config = GenerationConfig::new(77);
        let a = ScatterGridGenerator::new()
            .generate(&config, &mut utils::create_rng(&config))
            .unwrap();
        let b = ScatterGridGenerator::new()
            .generate(&config, &mut utils::create_rng(&config))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_densities() {
        let open = GenerationConfig {
            wall_chance: 0.0,
            trap_chance: 0.0,
            ..GenerationConfig::new(5)
        };
        let grid = ScatterGridGenerator::new()
            .generate(&open, &mut utils::create_rng(&open))
            .unwrap();
        let interior = (open.width as usize - 2) * (open.height as usize - 2);
        assert_eq!(grid.spawnable_positions().len(), interior);

        let trapped = GenerationConfig {
            wall_chance: 0.0,
            trap_chance: 0.5,
            ..GenerationConfig::new(5)
        };
        let grid = ScatterGridGenerator::new()
            .generate(&trapped, &mut utils::create_rng(&trapped))
            .unwrap();
        let traps = grid.positions().filter(|&pos| grid.is_trap(pos)).count();
        assert!(traps > interior / 4 && traps < interior * 3 / 4);
    }

    #[test]
    fn test_walls_start_known() {
        let config = GenerationConfig::new(8);
        let grid = ScatterGridGenerator::new()
            .generate(&config, &mut utils::create_rng(&config))
            .unwrap();
        assert!(grid.is_known(Position::new(0, 0)));
        let open = grid.spawnable_positions()[0];
        assert!(!grid.is_known(open));
    }
}
