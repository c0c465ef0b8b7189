//! # Roster
//!
//! Generation-checked arena that owns every actor of a session.
//!
//! Removing an actor bumps its slot's generation, so any [`ActorId`] still
//! held elsewhere (an NPC target, a projectile owner) stops resolving instead
//! of aliasing whatever is spawned into the slot next.

use crate::{Actor, ActorId, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    actor: Option<Actor>,
}

/// Arena of actors addressed by [`ActorId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an actor and returns its handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Actor, ActorTemplate, Position, Roster};
    ///
    /// let mut roster = Roster::new();
    /// let id = roster.insert(Actor::player(&ActorTemplate::player(), Position::new(1, 1)));
    /// assert!(roster.get(id).is_some());
    /// roster.remove(id);
    /// assert!(roster.get(id).is_none());
    /// ```
    pub fn insert(&mut self, actor: Actor) -> ActorId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.actor = Some(actor);
            return ActorId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            actor: Some(actor),
        });
        ActorId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Removes an actor. Stale handles return `None`.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let actor = slot.actor.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(actor)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.actor.as_ref())
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.actor.as_mut())
    }

    /// Borrows two distinct actors mutably at once.
    pub fn get_pair_mut(&mut self, a: ActorId, b: ActorId) -> Option<(&mut Actor, &mut Actor)> {
        if a.index == b.index || self.get(a).is_none() || self.get(b).is_none() {
            return None;
        }
        let (low, high, swapped) = if a.index < b.index {
            (a.index as usize, b.index as usize, false)
        } else {
            (b.index as usize, a.index as usize, true)
        };
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].actor.as_mut()?;
        let second = tail[0].actor.as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.get(id).is_some()
    }

    /// Present and not dead.
    pub fn is_alive(&self, id: ActorId) -> bool {
        self.get(id).map(|actor| !actor.stats.is_dead()).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.actor.as_ref().map(|actor| {
                (
                    ActorId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    actor,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// The living actor standing on `position`, if any.
    pub fn living_at(&self, position: Position) -> Option<ActorId> {
        self.iter()
            .find(|(_, actor)| actor.position == position && !actor.stats.is_dead())
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.actor.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
