//! # Entities
//!
//! Actors (the player and NPCs) and the capability traits shared with items.

use crate::{ActorStats, ActorTemplate, Color, Faction, HostilitySet, NpcMind, Position};
use serde::{Deserialize, Serialize};

/// Anything that occupies a grid position.
pub trait Positioned {
    fn position(&self) -> Position;
}

/// Anything carrying combat stats.
pub trait Statted {
    fn stats(&self) -> &ActorStats;
    fn stats_mut(&mut self) -> &mut ActorStats;

    fn is_alive(&self) -> bool {
        !self.stats().is_dead()
    }
}

/// Anything the renderer draws with a glyph.
pub trait Displayable {
    fn glyph(&self) -> char;
    fn color(&self) -> Color;
}

/// What drives an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Npc(NpcMind),
}

/// A player or NPC on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub faction: Faction,
    pub position: Position,
    pub stats: ActorStats,
    pub hostility: HostilitySet,
    pub kill_count: u32,
    pub glyph: char,
    pub color: Color,
    pub kind: ActorKind,
}

impl Actor {
    /// Builds the player from its template.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Actor, ActorTemplate, Faction, Position};
    ///
    /// let player = Actor::player(&ActorTemplate::player(), Position::new(3, 3));
    /// assert!(player.is_player());
    /// assert!(player.is_hostile_to(Faction::Enemy));
    /// ```
    pub fn player(template: &ActorTemplate, position: Position) -> Self {
        Self::from_template(template, Faction::Player, position, ActorKind::Player)
    }

    /// Builds an NPC of the given faction from its template.
    pub fn npc(template: &ActorTemplate, faction: Faction, position: Position) -> Self {
        let mind = NpcMind::new(template.max_aggression);
        Self::from_template(template, faction, position, ActorKind::Npc(mind))
    }

    fn from_template(
        template: &ActorTemplate,
        faction: Faction,
        position: Position,
        kind: ActorKind,
    ) -> Self {
        Self {
            name: template.name.clone(),
            faction,
            position,
            stats: ActorStats::new(
                template.level,
                template.health,
                template.stamina,
                template.damage,
                template.vis_range,
            ),
            hostility: HostilitySet::from_factions(
                template.hostile_to.iter().copied().filter(|&f| f != faction),
            ),
            kill_count: 0,
            glyph: template.glyph,
            color: template.color,
            kind,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, ActorKind::Player)
    }

    pub fn npc_mind(&self) -> Option<&NpcMind> {
        match &self.kind {
            ActorKind::Npc(mind) => Some(mind),
            ActorKind::Player => None,
        }
    }

    pub fn npc_mind_mut(&mut self) -> Option<&mut NpcMind> {
        match &mut self.kind {
            ActorKind::Npc(mind) => Some(mind),
            ActorKind::Player => None,
        }
    }

    pub fn is_hostile_to(&self, faction: Faction) -> bool {
        self.hostility.is_hostile_to(faction)
    }

    /// Adds or removes a hostile faction. An actor is never hostile to its own faction.
    pub fn set_relationship(&mut self, faction: Faction, hostile: bool) {
        if faction == self.faction && hostile {
            return;
        }
        self.hostility.set_relationship(faction, hostile);
    }

    /// Kill credit for defeating an actor of `victim_level`: at least one.
    pub fn award_kill(&mut self, victim_level: u32) -> u32 {
        let credit = victim_level.saturating_sub(self.stats.level()).max(1);
        self.kill_count += credit;
        credit
    }

    /// Squared distance to another position.
    pub fn distance_squared_to(&self, other: Position) -> i64 {
        self.position.distance_squared(other)
    }
}

impl Positioned for Actor {
    fn position(&self) -> Position {
        self.position
    }
}

impl Statted for Actor {
    fn stats(&self) -> &ActorStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut ActorStats {
        &mut self.stats
    }
}

impl Displayable for Actor {
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
    fn test_npc_from_template() {
        let template = ActorTemplate {
            name: "Goblin".to_string(),
            hostile_to: vec![Faction::Player, Faction::Enemy],
            max_aggression: 9,
            ..ActorTemplate::default()
        };
        let npc = Actor::npc(&template, Faction::Enemy, Position::new(2, 2));
        assert!(!npc.is_player());
        assert!(npc.is_hostile_to(Faction::Player));
        // own faction is filtered out
        assert!(!npc.is_hostile_to(Faction::Enemy));
        assert_eq!(npc.npc_mind().unwrap().max_aggression(), 9);
        assert!(npc.is_alive());
    }

    #[test]
    fn test_award_kill_is_at_least_one() {
        let mut actor = Actor::player(&ActorTemplate::player(), Position::origin());
        assert_eq!(actor.award_kill(5), 4);
        assert_eq!(actor.award_kill(1), 1);
        assert_eq!(actor.kill_count, 5);
    }

    #[test]
    fn test_never_hostile_to_own_faction() {
        let mut actor = Actor::player(&ActorTemplate::player(), Position::origin());
        actor.set_relationship(Faction::Player, true);
        assert!(!actor.is_hostile_to(Faction::Player));
    }
}
