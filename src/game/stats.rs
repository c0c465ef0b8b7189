//! # Actor Stats
//!
//! Value-type stat container with clamping and level-up rules.

use crate::config::{
    DAMAGE_LEVEL_DIVISOR, HEALTH_LEVEL_DIVISOR, LEVEL_RECOMPUTE_PERIOD, STAMINA_LEVEL_DIVISOR,
};
use serde::{Deserialize, Serialize};

/// Health, stamina, damage and level of an actor.
///
/// Invariants: `0 ≤ health ≤ max_health`, `0 ≤ stamina ≤ max_stamina`, and
/// `dead` is set exactly when health reaches 0 and never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorStats {
    level: u32,
    base_health: i32,
    base_stamina: i32,
    base_damage: i32,
    max_health: i32,
    max_stamina: i32,
    max_damage: i32,
    health: i32,
    stamina: i32,
    vis_range: i32,
    dead: bool,
}

impl ActorStats {
    /// Creates stats at full health and stamina.
    ///
    /// The base values become the initial ceilings regardless of `level`;
    /// ceilings only move when [`ActorStats::add_level`] crosses a
    /// recompute boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::ActorStats;
    ///
    /// let stats = ActorStats::new(1, 40, 30, 12, 6);
    /// assert_eq!(stats.health(), 40);
    /// assert_eq!(stats.max_stamina(), 30);
    /// assert!(!stats.is_dead());
    /// ```
    pub fn new(level: u32, health: i32, stamina: i32, damage: i32, vis_range: i32) -> Self {
        let health = health.max(1);
        let stamina = stamina.max(0);
        let damage = damage.max(0);
        Self {
            level: level.max(1),
            base_health: health,
            base_stamina: stamina,
            base_damage: damage,
            max_health: health,
            max_stamina: stamina,
            max_damage: damage,
            health,
            stamina,
            vis_range: vis_range.max(0),
            dead: false,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn stamina(&self) -> i32 {
        self.stamina
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn max_stamina(&self) -> i32 {
        self.max_stamina
    }

    pub fn max_damage(&self) -> i32 {
        self.max_damage
    }

    pub fn vis_range(&self) -> i32 {
        self.vis_range
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Adds `delta` to health, clamped to `[0, max_health]`, and returns the new value.
    ///
    /// Reaching 0 marks the actor dead. Dead actors ignore further changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::ActorStats;
    ///
    /// let mut stats = ActorStats::new(1, 10, 10, 5, 4);
    /// assert_eq!(stats.modify_health(-25), 0);
    /// assert!(stats.is_dead());
    /// assert_eq!(stats.modify_health(5), 0);
    /// assert!(stats.is_dead());
    /// ```
    pub fn modify_health(&mut self, delta: i32) -> i32 {
        if self.dead {
            return self.health;
        }
        self.health = self
            .health
            .saturating_add(delta)
            .clamp(0, self.max_health);
        if self.health == 0 {
            self.dead = true;
        }
        self.health
    }

    /// Adds `delta` to stamina, clamped to `[0, max_stamina]`, and returns the new value.
    pub fn modify_stamina(&mut self, delta: i32) -> i32 {
        self.stamina = self
            .stamina
            .saturating_add(delta)
            .clamp(0, self.max_stamina);
        self.stamina
    }

    /// Restores `percent` of both ceilings to the current values.
    pub fn restore_percent(&mut self, percent: i32) {
        let percent = percent.clamp(0, 100) as i64;
        let health = (self.max_health as i64 * percent / 100) as i32;
        let stamina = (self.max_stamina as i64 * percent / 100) as i32;
        self.modify_health(health);
        self.modify_stamina(stamina);
    }

    /// Increments the level and returns the new one.
    ///
    /// Leaving a level that is a multiple of three recomputes the ceilings as
    /// `base × (new_level / K)` per stat. Current health and stamina are left
    /// alone apart from clamping to the new ceilings.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::ActorStats;
    ///
    /// let mut stats = ActorStats::new(1, 40, 30, 12, 6);
    /// stats.add_level();
    /// assert_eq!(stats.max_health(), 40);
    /// stats.add_level();
    /// stats.add_level();
    /// assert_eq!(stats.level(), 4);
    /// assert_eq!(stats.max_health(), 106);
    /// ```
    pub fn add_level(&mut self) -> u32 {
        let previous = self.level;
        self.level += 1;
        if previous % LEVEL_RECOMPUTE_PERIOD == 0 {
            self.recompute_ceilings();
        }
        self.level
    }

    fn recompute_ceilings(&mut self) {
        let level = self.level as f64;
        self.max_health = scale(self.base_health, level, HEALTH_LEVEL_DIVISOR).max(1);
        self.max_stamina = scale(self.base_stamina, level, STAMINA_LEVEL_DIVISOR);
        self.max_damage = scale(self.base_damage, level, DAMAGE_LEVEL_DIVISOR);
        self.health = self.health.min(self.max_health);
        self.stamina = self.stamina.min(self.max_stamina);
    }
}

fn scale(base: i32, level: f64, divisor: f64) -> i32 {
    (base as f64 * (level / divisor)) as i32
}
