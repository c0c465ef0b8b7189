//! # Grid Module
//!
//! The tile grid: layout, fog of war and movement queries.
//!
//! Every coordinate inside `width × height` has exactly one [`Tile`]. Read
//! queries never fail; out-of-range positions answer with a safe default
//! (not walkable, not known). Construction problems are reported as
//! [`BrambleError::InvalidGrid`].

use crate::{BrambleError, BrambleResult, GenerationConfig, Position};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Display colour for glyphs. Interpreting it is the renderer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
}

/// How much a trap hurts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapDamage {
    /// A fixed number of health points
    Flat(i32),
    /// A percentage of the victim's maximum health
    Percent(i32),
}

impl TrapDamage {
    /// Builds the trap damage described by the rules' two trap knobs.
    pub fn from_rules(amount: i32, is_percent: bool) -> Self {
        if is_percent {
            TrapDamage::Percent(amount)
        } else {
            TrapDamage::Flat(amount)
        }
    }
}

/// The closed set of tile kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Empty,
    Wall,
    Trap { damage: TrapDamage },
    Door,
    Container,
    /// Imported character with no known meaning
    Undefined,
}

impl TileKind {
    /// Whether actors may stand on this tile.
    pub fn can_move(self) -> bool {
        matches!(self, TileKind::Empty | TileKind::Trap { .. } | TileKind::Door)
    }

    /// Whether stepping here triggers trap damage.
    pub fn is_trap(self) -> bool {
        matches!(self, TileKind::Trap { .. })
    }

    /// Whether actors and items may be spawned here.
    pub fn can_spawn(self) -> bool {
        matches!(self, TileKind::Empty)
    }

    /// Default glyph for the kind.
    pub fn glyph(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Wall => '#',
            TileKind::Trap { .. } => '^',
            TileKind::Door => '+',
            TileKind::Container => '=',
            TileKind::Undefined => ' ',
        }
    }

    /// Default colour for the kind.
    pub fn color(self) -> Color {
        match self {
            TileKind::Empty => Color::Gray,
            TileKind::Wall => Color::White,
            TileKind::Trap { .. } => Color::Red,
            TileKind::Door => Color::Yellow,
            TileKind::Container => Color::Cyan,
            TileKind::Undefined => Color::Default,
        }
    }

    /// Parses an import character. Unknown characters become `Undefined`.
    pub fn from_char(c: char, trap_damage: TrapDamage) -> Self {
        match c {
            '#' => TileKind::Wall,
            '.' => TileKind::Empty,
            '^' => TileKind::Trap {
                damage: trap_damage,
            },
            '+' => TileKind::Door,
            '=' => TileKind::Container,
            _ => TileKind::Undefined,
        }
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub glyph: char,
    pub color: Color,
    /// Discovered by the player
    pub known: bool,
}

impl Tile {
    /// Creates an undiscovered tile with the kind's default appearance.
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            glyph: kind.glyph(),
            color: kind.color(),
            known: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(TileKind::Empty)
    }

    pub fn wall() -> Self {
        Self::new(TileKind::Wall)
    }

    pub fn can_move(&self) -> bool {
        self.kind.can_move()
    }

    pub fn is_trap(&self) -> bool {
        self.kind.is_trap()
    }

    pub fn can_spawn(&self) -> bool {
        self.kind.can_spawn()
    }

    pub fn is_wall(&self) -> bool {
        self.kind == TileKind::Wall
    }
}

/// Fixed-size 2D tile matrix with fog-of-war bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Vec<Tile>>,
    walls_always_visible: bool,
    reveal_all: bool,
}

impl Grid {
    /// Creates a grid where every tile has the same kind.
    ///
    /// Zero-sized grids are rejected.
    pub fn filled(width: u32, height: u32, kind: TileKind) -> BrambleResult<Self> {
        if width == 0 || height == 0 {
            return Err(BrambleError::InvalidGrid(format!(
                "grid dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            tiles: vec![vec![Tile::new(kind); width as usize]; height as usize],
            walls_always_visible: false,
            reveal_all: false,
        })
    }

    /// Procedurally generates a grid from the given configuration.
    ///
    /// Edges are always walls; see [`crate::ScatterGridGenerator`] for the
    /// interior distribution.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{GenerationConfig, Grid, Position};
    ///
    /// let config = GenerationConfig::for_testing(7);
    /// let mut rng = bramble::generation::utils::create_rng(&config);
    /// let grid = Grid::generate(&config, &mut rng).unwrap();
    /// assert!(!grid.can_move_to(Position::new(0, 0)));
    /// ```
    pub fn generate(config: &GenerationConfig, rng: &mut StdRng) -> BrambleResult<Self> {
        use crate::Generator;
        crate::ScatterGridGenerator::new().generate(config, rng)
    }

    /// Builds a grid from text, one character per cell.
    ///
    /// Short rows are padded with `Undefined` tiles up to the longest row.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Grid, Position, TrapDamage};
    ///
    /// let grid = Grid::import_from(&["#####", "#.^.#", "#####"], false, false, TrapDamage::Flat(5)).unwrap();
    /// assert_eq!(grid.size(), (5, 3));
    /// assert!(grid.is_trap(Position::new(2, 1)));
    /// ```
    pub fn import_from<S: AsRef<str>>(
        lines: &[S],
        walls_always_visible: bool,
        reveal_all: bool,
        trap_damage: TrapDamage,
    ) -> BrambleResult<Self> {
        let rows: Vec<Vec<char>> = lines
            .iter()
            .map(|line| line.as_ref().trim_end_matches(['\r', '\n']).chars().collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return Err(BrambleError::InvalidGrid(
                "imported layout is empty".to_string(),
            ));
        }

        let tiles = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|x| {
                        let c = row.get(x).copied().unwrap_or('\0');
                        Tile::new(TileKind::from_char(c, trap_damage))
                    })
                    .collect()
            })
            .collect();

        let mut grid = Self {
            width: width as u32,
            height: rows.len() as u32,
            tiles,
            walls_always_visible: false,
            reveal_all: false,
        };
        grid.set_visibility_policy(walls_always_visible, reveal_all);
        Ok(grid)
    }

    /// Applies the fog-of-war policy and pre-reveals tiles accordingly.
    pub fn set_visibility_policy(&mut self, walls_always_visible: bool, reveal_all: bool) {
        self.walls_always_visible = walls_always_visible;
        self.reveal_all = reveal_all;
        for tile in self.tiles.iter_mut().flatten() {
            if reveal_all || (walls_always_visible && tile.is_wall()) {
                tile.known = true;
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grid dimensions as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Strict half-open bounds check.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn tile_at(&self, pos: Position) -> Option<&Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.tiles
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
    }

    fn tile_at_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.tiles
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
    }

    /// Replaces a tile. Out-of-range positions are ignored and return false.
    pub fn set_tile(&mut self, pos: Position, mut tile: Tile) -> bool {
        if self.reveal_all || (self.walls_always_visible && tile.is_wall()) {
            tile.known = true;
        }
        match self.tile_at_mut(pos) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    /// Valid position and walkable tile.
    pub fn can_move_to(&self, pos: Position) -> bool {
        self.tile_at(pos).map(Tile::can_move).unwrap_or(false)
    }

    pub fn is_trap(&self, pos: Position) -> bool {
        self.tile_at(pos).map(Tile::is_trap).unwrap_or(false)
    }

    pub fn can_spawn_at(&self, pos: Position) -> bool {
        self.tile_at(pos).map(Tile::can_spawn).unwrap_or(false)
    }

    /// Whether the player has discovered the tile.
    pub fn is_known(&self, pos: Position) -> bool {
        if !self.is_valid_position(pos) {
            return false;
        }
        self.reveal_all || self.tile_at(pos).map(|tile| tile.known).unwrap_or(false)
    }

    fn apply_visibility(tile: &mut Tile, visible: bool, walls_always_visible: bool, reveal_all: bool) {
        if visible {
            tile.known = true;
        } else if !reveal_all && !(walls_always_visible && tile.is_wall()) {
            tile.known = false;
        }
    }

    /// Marks every in-bounds tile with `dx² + dy² ≤ r²` as known or unknown.
    pub fn reveal_circle(&mut self, center: Position, radius: i32, visible: bool) {
        let r = radius.max(0) as i64;
        let (cx, cy) = (center.x as i64, center.y as i64);
        let (Some(xs), Some(ys)) = (
            clip_span(cx - r, cx + r, self.width),
            clip_span(cy - r, cy + r, self.height),
        ) else {
            return;
        };
        let (walls, all) = (self.walls_always_visible, self.reveal_all);
        for y in ys {
            for x in xs.clone() {
                let pos = Position::new(x, y);
                if !center.within_radius(pos, radius) {
                    continue;
                }
                if let Some(tile) = self.tile_at_mut(pos) {
                    Self::apply_visibility(tile, visible, walls, all);
                }
            }
        }
    }

    pub fn reveal_all(&mut self, visible: bool) {
        let (walls, all) = (self.walls_always_visible, self.reveal_all);
        for tile in self.tiles.iter_mut().flatten() {
            Self::apply_visibility(tile, visible, walls, all);
        }
    }

    /// Reveals or hides the inclusive rectangle between two corners, clipped to the grid.
    pub fn reveal_rect(&mut self, min: Position, max: Position, visible: bool) {
        let (Some(xs), Some(ys)) = (
            clip_span(min.x.min(max.x) as i64, min.x.max(max.x) as i64, self.width),
            clip_span(min.y.min(max.y) as i64, min.y.max(max.y) as i64, self.height),
        ) else {
            return;
        };
        let (walls, all) = (self.walls_always_visible, self.reveal_all);
        for y in ys {
            for x in xs.clone() {
                if let Some(tile) = self.tile_at_mut(Position::new(x, y)) {
                    Self::apply_visibility(tile, visible, walls, all);
                }
            }
        }
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }

    /// Positions whose tile allows spawning, in row-major order.
    pub fn spawnable_positions(&self) -> Vec<Position> {
        self.positions()
            .filter(|&pos| self.can_spawn_at(pos))
            .collect()
    }

    /// Whether the position lies on the outer ring.
    pub fn is_edge(&self, pos: Position) -> bool {
        self.is_valid_position(pos)
            && (pos.x == 0
                || pos.y == 0
                || pos.x as u32 == self.width - 1
                || pos.y as u32 == self.height - 1)
    }
}

/// The part of `lo..=hi` that lies inside `0..len`.
fn clip_span(lo: i64, hi: i64, len: u32) -> Option<std::ops::RangeInclusive<i32>> {
    let (lo, hi) = (lo.max(0), hi.min(len as i64 - 1));
    (lo <= hi).then(|| lo as i32..=hi as i32)
}
