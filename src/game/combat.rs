//! # Combat
//!
//! Melee attack resolution between two actors.
//!
//! The attacker's stamina picks one of three tiers:
//!
//! - **Full** (`stamina ≥ cost`): the target may block for a tenth of the damage
//! - **Half** (`stamina ≥ cost / 3`): a rested target absorbs most of the hit
//! - **Minimal** (otherwise): a rested target parries and the attacker takes
//!   the full roll instead
//!
//! Every tier charges the full cost; stamina clamps at zero.

use crate::{Actor, GameRules};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How an attack ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// Nothing happened (godmode target or a dead participant)
    Aborted,
    TargetAlive,
    TargetKilled,
    /// The target parried and killed the attacker
    AttackerKilled,
}

impl AttackOutcome {
    pub fn is_kill(self) -> bool {
        matches!(self, AttackOutcome::TargetKilled | AttackOutcome::AttackerKilled)
    }
}

/// Rolls a hit in `[max / 6, max]`; zero for actors without damage.
pub fn roll_damage(max_damage: i32, rng: &mut impl Rng) -> i32 {
    if max_damage <= 0 {
        return 0;
    }
    rng.gen_range(max_damage / 6..=max_damage)
}

fn roll(chance: f64, rng: &mut impl Rng) -> bool {
    rng.gen_bool(chance.clamp(0.0, 1.0))
}

/// Resolves one attack of `attacker` on `target`.
///
/// Kill credit goes to whoever survives a kill. When the target survives it
/// turns hostile to the attacker's faction. Recording the player's death is
/// left to the caller, which knows the game outcome.
///
/// # Examples
///
/// ```
/// use bramble::{resolve_attack, Actor, ActorTemplate, AttackOutcome, Faction, GameRules, Position};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let rules = GameRules { player_godmode: true, ..GameRules::for_testing() };
/// let mut goblin = Actor::npc(&ActorTemplate::default(), Faction::Enemy, Position::new(1, 1));
/// let mut player = Actor::player(&ActorTemplate::player(), Position::new(2, 1));
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let outcome = resolve_attack(&mut goblin, &mut player, &rules, &mut rng);
/// assert_eq!(outcome, AttackOutcome::Aborted);
/// assert_eq!(player.stats.health(), player.stats.max_health());
/// ```
pub fn resolve_attack(
    attacker: &mut Actor,
    target: &mut Actor,
    rules: &GameRules,
    rng: &mut impl Rng,
) -> AttackOutcome {
    if target.is_player() && rules.player_godmode {
        return AttackOutcome::Aborted;
    }
    if attacker.stats.is_dead() || target.stats.is_dead() {
        return AttackOutcome::Aborted;
    }

    let attacker_godmode = attacker.is_player() && rules.player_godmode;
    let cost = rules.attack_stamina_cost;
    let stamina_before = attacker.stats.stamina();
    let dmg = roll_damage(attacker.stats.max_damage(), rng);

    let mut target_damage = 0;
    let mut attacker_damage = 0;

    if stamina_before >= cost {
        attacker.stats.modify_stamina(-cost);
        if !roll(rules.attack_miss_chance_full, rng) {
            let blocked =
                target.stats.stamina() >= cost && roll(rules.attack_block_chance, rng);
            target_damage = if blocked { dmg / 10 } else { dmg };
        }
    } else if stamina_before >= cost / 3 {
        attacker.stats.modify_stamina(-cost);
        if !roll(rules.attack_miss_chance_drained, rng) {
            if target.stats.stamina() >= cost / 2 {
                target.stats.modify_stamina(-(cost / 2));
                target_damage = dmg / 20;
            } else {
                target_damage = dmg / 2;
            }
        }
    } else {
        attacker.stats.modify_stamina(-cost);
        if target.stats.stamina() >= cost / 2 {
            target.stats.modify_stamina(-(cost / 2));
            attacker_damage = dmg;
        } else if !roll(rules.attack_miss_chance_drained, rng) {
            target_damage = dmg / 4;
            attacker_damage = dmg / 12;
        }
    }

    if attacker_godmode {
        attacker_damage = 0;
    }

    target.stats.modify_health(-target_damage);
    attacker.stats.modify_health(-attacker_damage);

    debug!(
        "{} attacks {} (roll {}): {} dealt, {} taken",
        attacker.name, target.name, dmg, target_damage, attacker_damage
    );

    let outcome = if target.stats.is_dead() {
        let credit = attacker.award_kill(target.stats.level());
        debug!("{} killed {} (+{} kills)", attacker.name, target.name, credit);
        AttackOutcome::TargetKilled
    } else if attacker.stats.is_dead() {
        // same credit the attacker would have earned
        let credit = target
            .stats
            .level()
            .saturating_sub(attacker.stats.level())
            .max(1);
        target.kill_count += credit;
        debug!("{} parried and killed {} (+{} kills)", target.name, attacker.name, credit);
        AttackOutcome::AttackerKilled
    } else {
        target.set_relationship(attacker.faction, true);
        AttackOutcome::TargetAlive
    };

    if attacker_godmode {
        let spent = stamina_before - attacker.stats.stamina();
        attacker.stats.modify_stamina(spent);
    }

    outcome
}
