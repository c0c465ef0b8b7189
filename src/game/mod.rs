//! # Game Module
//!
//! Core simulation types: grid, actors, combat, NPC behaviour and the turn resolver.
//!
//! This module contains the fundamental building blocks of the Bramble engine:
//! - Tile grid with fog of war
//! - Actor stats, factions and the generation-checked roster
//! - Combat resolution and the NPC aggression state machine
//! - The [`Simulation`] that ties them together

pub mod behavior;
pub mod combat;
pub mod effects;
pub mod entities;
pub mod faction;
pub mod grid;
pub mod items;
pub mod outcome;
pub mod projectiles;
pub mod roster;
pub mod state;
pub mod stats;

pub use behavior::*;
pub use combat::*;
pub use effects::*;
pub use entities::*;
pub use faction::*;
pub use grid::*;
pub use items::*;
pub use outcome::*;
pub use projectiles::*;
pub use roster::*;
pub use state::*;
pub use stats::*;

use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the grid.
///
/// Used both as an absolute tile index and as a relative delta; bounds are
/// enforced by [`Grid`] queries, never by the type itself.
///
/// # Examples
///
/// ```
/// use bramble::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos + Position::new(1, -1), Position::new(11, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Squared Euclidean distance, exact in integers.
    pub fn distance_squared(self, other: Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Whether `other` lies within a circle of `radius` around this position.
    pub fn within_radius(self, other: Position, radius: i32) -> bool {
        let r = radius.max(0) as i64;
        self.distance_squared(other) <= r * r
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions for movement, projectiles and NPC steering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Rotates 90° clockwise.
    pub fn rotate_cw(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// Rotates 90° counter-clockwise.
    pub fn rotate_ccw(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    /// Returns all 4 directions, clockwise from north.
    pub fn all() -> Vec<Direction> {
        vec![
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }
}

/// Generation-checked handle to an actor in the [`Roster`].
///
/// A handle outlives the actor it names; once the slot is reused the old
/// handle simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ActorId {
    /// Slot index inside the roster.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
