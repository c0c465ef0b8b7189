//! # NPC Behaviour
//!
//! Aggression bookkeeping, fear and steering for non-player actors.
//!
//! An NPC moves through four states:
//!
//! - **Idle**: no aggression, wanders at random
//! - **AggroSeeking**: has a target in sight and paths toward it
//! - **AggroDecaying**: lost sight of its target; aggression ticks down
//! - **Fleeing**: aggravated but afraid, so steering is inverted
//!
//! Fleeing is not stored. It is derived every step from [`NpcMind::is_afraid`].

use crate::{ActorId, ActorStats, Direction, Faction, Position};
use serde::{Deserialize, Serialize};

/// Observable behaviour state of an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcState {
    Idle,
    AggroSeeking,
    AggroDecaying,
    Fleeing,
}

/// Per-NPC aggression and targeting memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcMind {
    aggression: i32,
    max_aggression: i32,
    target: Option<ActorId>,
    blind_cycles: u32,
    target_in_sight: bool,
}

impl NpcMind {
    pub fn new(max_aggression: i32) -> Self {
        Self {
            aggression: 0,
            max_aggression: max_aggression.max(0),
            target: None,
            blind_cycles: 0,
            target_in_sight: false,
        }
    }

    pub fn aggression(&self) -> i32 {
        self.aggression
    }

    pub fn max_aggression(&self) -> i32 {
        self.max_aggression
    }

    pub fn is_aggravated(&self) -> bool {
        self.aggression > 0
    }

    /// The stored target handle, without liveness checks.
    ///
    /// Prefer [`NpcMind::has_target`] before acting on it.
    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    pub fn target_in_sight(&self) -> bool {
        self.target_in_sight
    }

    /// Locks onto `candidate` at full aggression.
    ///
    /// Candidates of the NPC's own faction are rejected and leave the mind unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Faction, NpcMind, Roster, Actor, ActorTemplate, Position};
    ///
    /// let mut roster = Roster::new();
    /// let player = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
    ///
    /// let mut mind = NpcMind::new(10);
    /// assert!(!mind.set_target_max_aggro(player, Faction::Enemy, Faction::Enemy));
    /// assert!(mind.set_target_max_aggro(player, Faction::Player, Faction::Enemy));
    /// assert_eq!(mind.aggression(), 10);
    /// ```
    pub fn set_target_max_aggro(
        &mut self,
        candidate: ActorId,
        candidate_faction: Faction,
        own_faction: Faction,
    ) -> bool {
        if candidate_faction == own_faction {
            return false;
        }
        self.target = Some(candidate);
        self.aggression = self.max_aggression.max(1);
        self.target_in_sight = true;
        true
    }

    /// Whether the NPC still has a live target.
    ///
    /// Clears a target that `is_alive` reports dead or gone, so a previous
    /// `true` is no promise about the next call.
    pub fn has_target(&mut self, is_alive: impl FnOnce(ActorId) -> bool) -> bool {
        match self.target {
            Some(target) if is_alive(target) => true,
            Some(_) => {
                self.clear_target();
                false
            }
            None => false,
        }
    }

    /// Drops the target and all aggression.
    pub fn clear_target(&mut self) {
        self.target = None;
        self.aggression = 0;
        self.target_in_sight = false;
    }

    /// Forgets `removed` if it is the current target.
    pub fn forget(&mut self, removed: ActorId) {
        if self.target == Some(removed) {
            self.clear_target();
        }
    }

    /// Out-of-sight tick: aggression drops by one, and the target is
    /// released once it reaches zero. Returns the remaining aggression.
    pub fn decay_aggression(&mut self) -> i32 {
        self.target_in_sight = false;
        self.aggression = (self.aggression - 1).max(0);
        if self.aggression == 0 {
            self.target = None;
        }
        self.aggression
    }

    pub fn blind(&mut self, cycles: u32) {
        self.blind_cycles = self.blind_cycles.max(cycles);
    }

    pub fn is_blind(&self) -> bool {
        self.blind_cycles > 0
    }

    /// Counts one cycle of blindness down.
    pub fn tick_blindness(&mut self) {
        self.blind_cycles = self.blind_cycles.saturating_sub(1);
    }

    /// Low health, low stamina or blindness.
    pub fn is_afraid(&self, stats: &ActorStats) -> bool {
        stats.health() < stats.max_health() / 6
            || stats.stamina() < stats.max_stamina() / 6
            || self.is_blind()
    }

    pub fn state(&self, stats: &ActorStats) -> NpcState {
        if !self.is_aggravated() {
            NpcState::Idle
        } else if self.is_afraid(stats) {
            NpcState::Fleeing
        } else if self.target_in_sight {
            NpcState::AggroSeeking
        } else {
            NpcState::AggroDecaying
        }
    }
}

/// Picks the cardinal step that closes (or, inverted, opens) `delta`.
///
/// Steps along the axis with the larger gap, horizontal on ties. Aligned and
/// nearly aligned deltas fall out of the same rule.
///
/// Returns `None` for a zero delta.
///
/// # Examples
///
/// ```
/// use bramble::{direction_to, Direction, Position};
///
/// assert_eq!(direction_to(Position::new(0, 4), false), Some(Direction::South));
/// assert_eq!(direction_to(Position::new(-5, 2), false), Some(Direction::West));
/// assert_eq!(direction_to(Position::new(-5, 2), true), Some(Direction::East));
/// assert_eq!(direction_to(Position::new(0, 0), false), None);
/// ```
pub fn direction_to(delta: Position, invert: bool) -> Option<Direction> {
    let (dx, dy) = (delta.x, delta.y);
    if dx == 0 && dy == 0 {
        return None;
    }
    // aligned and nearly aligned deltas both close the larger gap
    let horizontal = dx.unsigned_abs() >= dy.unsigned_abs();

    let direction = if horizontal {
        if dx > 0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if dy > 0 {
        Direction::South
    } else {
        Direction::North
    };

    Some(if invert { direction.opposite() } else { direction })
}

/// Primary step followed by its two ±90° fallbacks in the given order.
pub fn steering_candidates(primary: Direction, clockwise_first: bool) -> [Direction; 3] {
    if clockwise_first {
        [primary, primary.rotate_cw(), primary.rotate_ccw()]
    } else {
        [primary, primary.rotate_ccw(), primary.rotate_cw()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Actor, ActorTemplate, Roster};

    fn id_pair() -> (Roster, ActorId, ActorId) {
        let mut roster = Roster::new();
        let a = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
        let b = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(2, 1)));
        (roster, a, b)
    }

    #[test]
    fn test_direction_aligned_axes() {
        assert_eq!(direction_to(Position::new(3, 0), false), Some(Direction::East));
        assert_eq!(direction_to(Position::new(-1, 0), false), Some(Direction::West));
        assert_eq!(direction_to(Position::new(0, -7), false), Some(Direction::North));
        assert_eq!(direction_to(Position::new(0, -7), true), Some(Direction::South));
    }

    #[test]
    fn test_direction_nearly_aligned_closes_larger_gap() {
        assert_eq!(direction_to(Position::new(1, 6), false), Some(Direction::South));
        assert_eq!(direction_to(Position::new(-1, -3), false), Some(Direction::North));
        assert_eq!(direction_to(Position::new(6, -1), false), Some(Direction::East));
        assert_eq!(direction_to(Position::new(-4, 1), true), Some(Direction::East));
    }

    #[test]
    fn test_direction_general_case_and_ties() {
        assert_eq!(direction_to(Position::new(5, 3), false), Some(Direction::East));
        assert_eq!(direction_to(Position::new(2, -6), false), Some(Direction::North));
        assert_eq!(direction_to(Position::new(3, 3), false), Some(Direction::East));
        assert_eq!(direction_to(Position::new(-1, 1), false), Some(Direction::West));
        assert_eq!(direction_to(Position::new(-1, 1), true), Some(Direction::East));
        assert_eq!(direction_to(Position::new(i32::MIN, 3), false), Some(Direction::West));
    }

    #[test]
    fn test_steering_candidates() {
        assert_eq!(
            steering_candidates(Direction::North, true),
            [Direction::North, Direction::East, Direction::West]
        );
        assert_eq!(
            steering_candidates(Direction::North, false),
            [Direction::North, Direction::West, Direction::East]
        );
    }

    #[test]
    fn test_aggression_decays_then_releases_target() {
        let (_, player, _) = id_pair();
        let mut mind = NpcMind::new(2);
        mind.set_target_max_aggro(player, Faction::Player, Faction::Enemy);
        assert_eq!(mind.decay_aggression(), 1);
        assert_eq!(mind.target(), Some(player));
        assert_eq!(mind.decay_aggression(), 0);
        assert_eq!(mind.target(), None);
        assert_eq!(mind.decay_aggression(), 0);
    }

    #[test]
    fn test_has_target_self_heals() {
        let (mut roster, target, _) = id_pair();
        let mut mind = NpcMind::new(5);
        mind.set_target_max_aggro(target, Faction::Player, Faction::Enemy);
        assert!(mind.has_target(|id| roster.is_alive(id)));

        roster.get_mut(target).unwrap().stats.modify_health(-10_000);
        assert!(!mind.has_target(|id| roster.is_alive(id)));
        assert_eq!(mind.target(), None);
        assert_eq!(mind.aggression(), 0);
    }

    #[test]
    fn test_forget_only_matching_target() {
        let (_, a, b) = id_pair();
        let mut mind = NpcMind::new(5);
        mind.set_target_max_aggro(a, Faction::Player, Faction::Enemy);
        mind.forget(b);
        assert_eq!(mind.target(), Some(a));
        mind.forget(a);
        assert_eq!(mind.target(), None);
    }

    #[test]
    fn test_states() {
        let (_, target, _) = id_pair();
        let healthy = ActorStats::new(1, 60, 60, 5, 5);
        let mut mind = NpcMind::new(4);
        assert_eq!(mind.state(&healthy), NpcState::Idle);

        mind.set_target_max_aggro(target, Faction::Player, Faction::Enemy);
        assert_eq!(mind.state(&healthy), NpcState::AggroSeeking);

        mind.decay_aggression();
        assert_eq!(mind.state(&healthy), NpcState::AggroDecaying);

        let mut hurt = healthy.clone();
        hurt.modify_health(-55);
        assert!(mind.is_afraid(&hurt));
        assert_eq!(mind.state(&hurt), NpcState::Fleeing);

        let mut winded = healthy.clone();
        winded.modify_stamina(-60);
        assert!(mind.is_afraid(&winded));

        mind.blind(2);
        assert!(mind.is_afraid(&healthy));
        mind.tick_blindness();
        mind.tick_blindness();
        assert!(!mind.is_afraid(&healthy));
    }
}
