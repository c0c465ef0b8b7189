//! # Bramble Roguelike Engine
//!
//! A real-time, tile-grid roguelike simulation with aggression-driven NPCs.
//!
//! ## Architecture Overview
//!
//! The engine is a single [`Simulation`] that owns the tile grid, every actor
//! and every item. External collaborators drive it on independent cadences:
//!
//! - **Input**: player key presses resolved through [`Controls`]
//! - **NPC cycle**: one action per living NPC, followed by cleanup
//! - **Maintenance**: passive regeneration and level-ups
//! - **Rendering**: read-only [`FrameSnapshot`]s taken under the same lock
//!
//! The [`runtime`] module provides the shared lock and the cadenced loops.
//! Game rules are plain serde data ([`GameRules`]) loaded once at
//! construction time.

pub mod game;
pub mod generation;
pub mod input;
pub mod rules;
pub mod runtime;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rules::*;
pub use runtime::*;

/// Core error type for the Bramble engine.
#[derive(thiserror::Error, Debug)]
pub enum BrambleError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Rules or templates are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Grid could not be built
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// An actor or item cannot be placed at the requested position
    #[error("Invalid spawn at ({x}, {y}): {reason}")]
    InvalidSpawn { x: i32, y: i32, reason: String },

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A worker panicked while holding the simulation lock
    #[error("Simulation lock poisoned")]
    LockPoisoned,
}

/// Result type used throughout the Bramble codebase.
pub type BrambleResult<T> = Result<T, BrambleError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Default grid width in tiles
    pub const DEFAULT_GRID_WIDTH: u32 = 60;

    /// Default grid height in tiles
    pub const DEFAULT_GRID_HEIGHT: u32 = 24;

    /// Smallest grid the procedural generator accepts on either axis
    pub const MIN_GRID_SIZE: u32 = 10;

    /// Largest grid the rules accept on either axis
    pub const MAX_GRID_SIZE: u32 = 512;

    /// Upper bound for sight ranges and the aggravated sight bonus
    pub const MAX_VIS_RANGE: i32 = 1024;

    /// Chance for an interior tile to become a wall
    pub const DEFAULT_WALL_CHANCE: f64 = 0.07;

    /// Chance for an interior tile to become a trap
    pub const DEFAULT_TRAP_CHANCE: f64 = 0.02;

    /// Level-up ceiling divisors, one per stat
    pub const HEALTH_LEVEL_DIVISOR: f64 = 1.5;
    pub const STAMINA_LEVEL_DIVISOR: f64 = 1.3;
    pub const DAMAGE_LEVEL_DIVISOR: f64 = 1.9;

    /// Ceilings are recomputed every this many levels
    pub const LEVEL_RECOMPUTE_PERIOD: u32 = 3;

    /// Frames a flare stays on screen
    pub const FLARE_FRAMES: u32 = 12;

    /// Frames per second cap for the render loop
    pub const TARGET_FPS: u64 = 30;

    /// How long the input loop waits for a key before re-checking its flags
    pub const INPUT_POLL_MILLIS: u64 = 50;
}
