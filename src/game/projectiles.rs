//! # Projectiles
//!
//! Shots fired by the player. They travel one tile per NPC cycle.

use crate::{Actor, ActorId, Color, Direction, Displayable, Faction, Position, Positioned};
use serde::{Deserialize, Serialize};

/// A shot in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: ActorId,
    pub position: Position,
    pub direction: Direction,
    pub damage: i32,
    /// Tiles left before the shot drops
    pub remaining_range: u32,
}

impl Projectile {
    pub fn new(
        owner: ActorId,
        origin: Position,
        direction: Direction,
        damage: i32,
        range: u32,
    ) -> Self {
        Self {
            owner,
            position: origin,
            direction,
            damage: damage.max(0),
            remaining_range: range,
        }
    }

    /// Where the shot will be after its next step.
    pub fn next_position(&self) -> Position {
        self.position + self.direction.to_delta()
    }

    /// Moves one tile. Returns `None` once the range is used up.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Actor, ActorTemplate, Direction, Position, Projectile, Roster};
    ///
    /// let mut roster = Roster::new();
    /// let owner = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
    /// let mut shot = Projectile::new(owner, Position::new(1, 1), Direction::East, 4, 2);
    /// assert_eq!(shot.advance(), Some(Position::new(2, 1)));
    /// assert_eq!(shot.advance(), Some(Position::new(3, 1)));
    /// assert_eq!(shot.advance(), None);
    /// ```
    pub fn advance(&mut self) -> Option<Position> {
        if self.remaining_range == 0 {
            return None;
        }
        self.remaining_range -= 1;
        self.position = self.next_position();
        Some(self.position)
    }

    /// Damages `target`. NPCs are blinded and turn on the shooter.
    ///
    /// Returns true when the hit killed the target.
    pub fn strike(&self, target: &mut Actor, shooter_faction: Faction, blind_cycles: u32) -> bool {
        target.stats.modify_health(-self.damage);
        if target.stats.is_dead() {
            return true;
        }
        target.set_relationship(shooter_faction, true);
        let own_faction = target.faction;
        if let Some(mind) = target.npc_mind_mut() {
            mind.blind(blind_cycles);
            mind.set_target_max_aggro(self.owner, shooter_faction, own_faction);
        }
        false
    }
}

impl Positioned for Projectile {
    fn position(&self) -> Position {
        self.position
    }
}

impl Displayable for Projectile {
    fn glyph(&self) -> char {
        match self.direction {
            Direction::North | Direction::South => '|',
            Direction::East | Direction::West => '-',
        }
    }

    fn color(&self) -> Color {
        Color::White
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActorTemplate, Roster};

    #[test]
    fn test_strike_blinds_and_aggravates_npc() {
        let mut roster = Roster::new();
        let owner = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
        let shot = Projectile::new(owner, Position::new(1, 1), Direction::East, 5, 4);
        let mut rat = Actor::npc(&ActorTemplate::default(), Faction::Neutral, Position::new(3, 1));

        assert!(!shot.strike(&mut rat, Faction::Player, 3));
        assert_eq!(rat.stats.health(), rat.stats.max_health() - 5);
        assert!(rat.is_hostile_to(Faction::Player));
        let mind = rat.npc_mind().unwrap();
        assert!(mind.is_blind());
        assert_eq!(mind.target(), Some(owner));
        assert!(mind.is_aggravated());
    }

    #[test]
    fn test_strike_reports_kill() {
        let mut roster = Roster::new();
        let owner = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
        let shot = Projectile::new(owner, Position::new(1, 1), Direction::South, 1000, 4);
        let mut rat = Actor::npc(&ActorTemplate::default(), Faction::Neutral, Position::new(1, 2));
        assert!(shot.strike(&mut rat, Faction::Player, 3));
        assert!(rat.stats.is_dead());
    }

    #[test]
    fn test_glyph_follows_direction() {
        let mut roster = Roster::new();
        let owner = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
        let shot = Projectile::new(owner, Position::new(1, 1), Direction::North, 1, 1);
        assert_eq!(shot.glyph(), '|');
    }
}
