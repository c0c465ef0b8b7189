//! # Input Module
//!
//! Key bindings and the player commands they resolve to.
//!
//! Bindings are an explicit [`Controls`] value handed to every entry point
//! that needs one; nothing reads a global control scheme.

pub mod commands;

pub use commands::*;

use crate::{BrambleError, BrambleResult, Direction};
use serde::{Deserialize, Serialize};

/// Player commands a key can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// Step (or attack) in a direction
    Move(Direction),
    /// Launch a projectile in a direction
    Fire(Direction),
    /// Quit the game
    Quit,
}

/// A key binding scheme.
///
/// Fire keys are the uppercase forms of the move keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub up: char,
    pub left: char,
    pub down: char,
    pub right: char,
    pub quit: char,
}

impl Default for Controls {
    fn default() -> Self {
        Self::wasd()
    }
}

impl Controls {
    /// `w a s d`, quit with `q`.
    pub fn wasd() -> Self {
        Self {
            up: 'w',
            left: 'a',
            down: 's',
            right: 'd',
            quit: 'q',
        }
    }

    /// Vi-style `k h j l`, quit with `q`.
    pub fn vi() -> Self {
        Self {
            up: 'k',
            left: 'h',
            down: 'j',
            right: 'l',
            quit: 'q',
        }
    }

    /// Looks a scheme up by name.
    pub fn by_name(name: &str) -> BrambleResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wasd" => Ok(Self::wasd()),
            "vi" | "hjkl" => Ok(Self::vi()),
            other => Err(BrambleError::InvalidConfig(format!(
                "unknown control scheme '{}'",
                other
            ))),
        }
    }

    /// Movement direction bound to `key`, ignoring fire keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Controls, Direction};
    ///
    /// let controls = Controls::wasd();
    /// assert_eq!(controls.direction_for('a'), Some(Direction::West));
    /// assert_eq!(controls.direction_for('x'), None);
    /// ```
    pub fn direction_for(&self, key: char) -> Option<Direction> {
        if key == self.up {
            Some(Direction::North)
        } else if key == self.left {
            Some(Direction::West)
        } else if key == self.down {
            Some(Direction::South)
        } else if key == self.right {
            Some(Direction::East)
        } else {
            None
        }
    }

    /// Resolves a key press. Unbound keys give `None`.
    pub fn resolve(&self, key: char) -> Option<PlayerInput> {
        if key == self.quit {
            return Some(PlayerInput::Quit);
        }
        if let Some(direction) = self.direction_for(key) {
            return Some(PlayerInput::Move(direction));
        }
        if key.is_uppercase() {
            let lower = key.to_lowercase().next()?;
            if lower != key {
                return self.direction_for(lower).map(PlayerInput::Fire);
            }
        }
        None
    }

    /// Every key this scheme reacts to.
    pub fn keys(&self) -> Vec<char> {
        let moves = [self.up, self.left, self.down, self.right];
        let mut keys: Vec<char> = moves.to_vec();
        keys.extend(moves.iter().flat_map(|key| key.to_uppercase()));
        keys.push(self.quit);
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_moves_fire_and_quit() {
        let controls = Controls::wasd();
        assert_eq!(controls.resolve('w'), Some(PlayerInput::Move(Direction::North)));
        assert_eq!(controls.resolve('D'), Some(PlayerInput::Fire(Direction::East)));
        assert_eq!(controls.resolve('q'), Some(PlayerInput::Quit));
        assert_eq!(controls.resolve('z'), None);
        assert_eq!(controls.resolve('Z'), None);
        assert_eq!(controls.resolve('1'), None);
    }

    #[test]
    fn test_vi_scheme() {
        let controls = Controls::by_name("vi").unwrap();
        assert_eq!(controls.resolve('h'), Some(PlayerInput::Move(Direction::West)));
        assert_eq!(controls.resolve('J'), Some(PlayerInput::Fire(Direction::South)));
        assert_eq!(controls.resolve('w'), None);
        assert!(Controls::by_name("arrows").is_err());
    }

    #[test]
    fn test_keys_cover_every_binding() {
        let controls = Controls::default();
        let keys = controls.keys();
        assert_eq!(keys.len(), 9);
        for key in keys {
            assert!(controls.resolve(key).is_some());
        }
    }
}
