//! # Items
//!
//! Static pickups lying on the grid. Stepping on one uses it.

use crate::{Color, Displayable, Faction, Position, Positioned};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What an item does when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    RestoreHealth(i32),
    RestoreStamina(i32),
}

impl ItemEffect {
    pub fn glyph(self) -> char {
        match self {
            ItemEffect::RestoreHealth(_) => '!',
            ItemEffect::RestoreStamina(_) => '?',
        }
    }

    pub fn color(self) -> Color {
        match self {
            ItemEffect::RestoreHealth(_) => Color::Red,
            ItemEffect::RestoreStamina(_) => Color::Blue,
        }
    }
}

/// A usable item fixed to one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatic {
    pub position: Position,
    pub glyph: char,
    pub color: Color,
    pub remaining_uses: u32,
    /// Factions allowed to use the item; empty means everyone
    pub faction_lock: HashSet<Faction>,
    pub effect: ItemEffect,
}

impl ItemStatic {
    /// Creates an unlocked item with the effect's default appearance.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Faction, ItemEffect, ItemStatic, Position};
    ///
    /// let potion = ItemStatic::new(Position::new(4, 4), ItemEffect::RestoreHealth(20), 1)
    ///     .locked_to([Faction::Player]);
    /// assert!(potion.usable_by(Faction::Player));
    /// assert!(!potion.usable_by(Faction::Enemy));
    /// ```
    pub fn new(position: Position, effect: ItemEffect, uses: u32) -> Self {
        Self {
            position,
            glyph: effect.glyph(),
            color: effect.color(),
            remaining_uses: uses,
            faction_lock: HashSet::new(),
            effect,
        }
    }

    /// Restricts use to the given factions.
    pub fn locked_to(mut self, factions: impl IntoIterator<Item = Faction>) -> Self {
        self.faction_lock = factions.into_iter().collect();
        self
    }

    pub fn usable_by(&self, faction: Faction) -> bool {
        !self.is_exhausted() && (self.faction_lock.is_empty() || self.faction_lock.contains(&faction))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_uses == 0
    }

    /// Spends one use. Returns false when nothing was left.
    pub fn consume(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.remaining_uses -= 1;
        true
    }
}

impl Positioned for ItemStatic {
    fn position(&self) -> Position {
        self.position
    }
}

impl Displayable for ItemStatic {
    fn glyph(&self) -> char {
        self.glyph
    }

    fn color(&self) -> Color {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_until_exhausted() {
        let mut item = ItemStatic::new(Position::origin(), ItemEffect::RestoreStamina(5), 2);
        assert!(item.consume());
        assert!(item.consume());
        assert!(item.is_exhausted());
        assert!(!item.consume());
        assert!(!item.usable_by(Faction::Player));
    }

    #[test]
    fn test_unlocked_item_is_usable_by_anyone() {
        let item = ItemStatic::new(Position::origin(), ItemEffect::RestoreHealth(5), 1);
        for faction in [Faction::Player, Faction::Enemy, Faction::Neutral, Faction::None] {
            assert!(item.usable_by(faction));
        }
    }
}
