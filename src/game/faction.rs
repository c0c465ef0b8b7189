//! # Factions
//!
//! Coarse actor groups and the per-actor hostility set.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A coarse group governing default hostility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Player,
    Enemy,
    Neutral,
    /// Passive, never targeted by default
    None,
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Faction::Player => "player",
            Faction::Enemy => "enemy",
            Faction::Neutral => "neutral",
            Faction::None => "none",
        };
        f.write_str(name)
    }
}

/// The factions an actor treats as enemies.
///
/// Mutable at runtime: an actor becomes hostile to whoever attacks it.
///
/// # Examples
///
/// ```
/// use bramble::{Faction, HostilitySet};
///
/// let mut hostility = HostilitySet::from_factions([Faction::Player]);
/// assert!(hostility.is_hostile_to(Faction::Player));
/// hostility.set_relationship(Faction::Neutral, true);
/// hostility.set_relationship(Faction::Player, false);
/// assert!(!hostility.is_hostile_to(Faction::Player));
/// assert!(hostility.is_hostile_to(Faction::Neutral));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostilitySet {
    factions: HashSet<Faction>,
}

impl HostilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_factions(factions: impl IntoIterator<Item = Faction>) -> Self {
        Self {
            factions: factions.into_iter().collect(),
        }
    }

    pub fn is_hostile_to(&self, faction: Faction) -> bool {
        self.factions.contains(&faction)
    }

    /// Adds or removes a faction. Idempotent.
    pub fn set_relationship(&mut self, faction: Faction, hostile: bool) {
        if hostile {
            self.factions.insert(faction);
        } else {
            self.factions.remove(&faction);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Faction> + '_ {
        self.factions.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }
}
