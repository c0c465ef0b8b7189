//! # Effects
//!
//! Tile and item effects as plain data, resolved by one pure function.

use crate::{ActorStats, ItemEffect, TileKind, TrapDamage};

/// Anything that changes an actor's stats when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSource {
    Tile(TileKind),
    Item(ItemEffect),
}

/// Stat change produced by an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatDelta {
    pub health: i32,
    pub stamina: i32,
}

impl StatDelta {
    pub fn is_zero(self) -> bool {
        self.health == 0 && self.stamina == 0
    }

    /// Applies the delta and returns the actor's resulting health.
    pub fn apply(self, stats: &mut ActorStats) -> i32 {
        stats.modify_stamina(self.stamina);
        stats.modify_health(self.health)
    }
}

/// Computes what `source` does to an actor with `stats`, without applying it.
///
/// # Examples
///
/// ```
/// use bramble::{apply_effect, ActorStats, EffectSource, TileKind, TrapDamage};
///
/// let stats = ActorStats::new(1, 80, 20, 5, 5);
/// let trap = EffectSource::Tile(TileKind::Trap { damage: TrapDamage::Percent(25) });
/// assert_eq!(apply_effect(trap, &stats).health, -20);
/// ```
pub fn apply_effect(source: EffectSource, stats: &ActorStats) -> StatDelta {
    match source {
        EffectSource::Tile(TileKind::Trap { damage }) => StatDelta {
            health: -trap_damage(damage, stats),
            stamina: 0,
        },
        EffectSource::Tile(_) => StatDelta::default(),
        EffectSource::Item(ItemEffect::RestoreHealth(amount)) => StatDelta {
            health: amount,
            stamina: 0,
        },
        EffectSource::Item(ItemEffect::RestoreStamina(amount)) => StatDelta {
            health: 0,
            stamina: amount,
        },
    }
}

fn trap_damage(damage: TrapDamage, stats: &ActorStats) -> i32 {
    match damage {
        TrapDamage::Flat(amount) => amount.max(0),
        TrapDamage::Percent(percent) => {
            (stats.max_health() as i64 * percent.clamp(0, 100) as i64 / 100) as i32
        }
    }
}
