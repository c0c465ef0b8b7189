//! # Simulation Module
//!
//! The turn resolver: owns the grid, every actor, item and projectile, and
//! exposes the entry points the scheduler drives and the queries the
//! renderer reads.
//!
//! Every entry point runs to completion and leaves the state consistent, so
//! callers only need to serialize calls against each other (see
//! [`crate::runtime`]). Once the game is over every entry point is a no-op.

use crate::generation::utils;
use crate::{
    apply_effect, direction_to, resolve_attack, roll_damage, steering_candidates, Actor,
    ActorId, ActorTemplate, AttackOutcome, BrambleError, BrambleResult, Controls, Direction,
    EffectSource, EncounterGenerator, Faction, Flare, FlareKind, GameOutcome, GameRules,
    GenerationConfig, Generator, Grid, ItemGenerator, ItemStatic, NpcMind, OutcomeSnapshot,
    PlayerInput, Position, Projectile, SpawnPlan, Tile,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::roster::Roster;

/// Result of a single movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Moved,
    Blocked,
    /// The destination was occupied by someone worth hitting
    Attacked(AttackOutcome),
}

/// Kills an actor of `level` needs before its next level-up.
///
/// # Examples
///
/// ```
/// use bramble::{kills_for_next_level, GameRules};
///
/// let rules = GameRules::default(); // threshold 3, multiplier 1.5
/// assert_eq!(kills_for_next_level(1, &rules), 3);
/// assert_eq!(kills_for_next_level(2, &rules), 5);
/// assert_eq!(kills_for_next_level(3, &rules), 7);
/// ```
pub fn kills_for_next_level(level: u32, rules: &GameRules) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    let needed = rules.level_up_kill_threshold as f64
        * rules.level_up_threshold_multiplier.powi(exponent);
    needed.ceil().min(u32::MAX as f64) as u32
}

/// The game world and its rules engine.
#[derive(Debug)]
pub struct Simulation {
    grid: Grid,
    roster: Roster,
    player_id: ActorId,
    items: Vec<ItemStatic>,
    projectiles: Vec<Projectile>,
    rules: GameRules,
    outcome: Arc<GameOutcome>,
    rng: StdRng,
    seed: u64,
    initial_enemy_count: usize,
    boss_spawned: bool,
    cycle: u64,
}

impl Simulation {
    /// Builds a complete session: generated grid, player, enemies, neutrals,
    /// the boss (unless it waits for the finale) and items.
    ///
    /// # Examples
    ///
    /// ```
    /// use bramble::{Faction, GameRules, Simulation};
    ///
    /// let rules = GameRules { enemy_count: 3, ..GameRules::default() };
    /// let sim = Simulation::new(rules, 42).unwrap();
    /// assert!(sim.player().is_some());
    /// assert_eq!(sim.initial_enemy_count(), 3);
    /// ```
    pub fn new(rules: GameRules, seed: u64) -> BrambleResult<Self> {
        rules.validate()?;
        let config = GenerationConfig::from_rules(&rules, seed);
        let mut rng = utils::create_rng(&config);
        let grid = Grid::generate(&config, &mut rng)?;
        let player_at = grid
            .spawnable_positions()
            .choose(&mut rng)
            .copied()
            .ok_or_else(|| BrambleError::InvalidGrid("no room for the player".to_string()))?;

        let mut sim = Self::assemble(grid, rules, rng, seed, player_at)?;
        sim.populate()?;
        info!(
            "Simulation ready: {}x{} grid, {} actors, {} items (seed {})",
            sim.grid.width(),
            sim.grid.height(),
            sim.roster.len(),
            sim.items.len(),
            seed
        );
        Ok(sim)
    }

    /// Builds a session on a prepared grid with only the player on it.
    ///
    /// NPCs and items are added with [`Simulation::spawn_npc`] and
    /// [`Simulation::spawn_item`].
    pub fn with_grid(
        grid: Grid,
        rules: GameRules,
        seed: u64,
        player_at: Position,
    ) -> BrambleResult<Self> {
        rules.validate()?;
        if !grid.can_move_to(player_at) {
            return Err(BrambleError::InvalidSpawn {
                x: player_at.x,
                y: player_at.y,
                reason: "player cannot stand here".to_string(),
            });
        }
        Self::assemble(grid, rules, StdRng::seed_from_u64(seed), seed, player_at)
    }

    fn assemble(
        mut grid: Grid,
        rules: GameRules,
        rng: StdRng,
        seed: u64,
        player_at: Position,
    ) -> BrambleResult<Self> {
        let mut roster = Roster::new();
        let player = Actor::player(&rules.player, player_at);
        grid.reveal_circle(player_at, player.stats.vis_range(), true);
        let player_id = roster.insert(player);

        Ok(Self {
            grid,
            roster,
            player_id,
            items: Vec::new(),
            projectiles: Vec::new(),
            rules,
            outcome: Arc::new(GameOutcome::new()),
            rng,
            seed,
            initial_enemy_count: 0,
            boss_spawned: false,
            cycle: 0,
        })
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::from_rules(&self.rules, self.seed)
    }

    fn occupied_positions(&self) -> Vec<Position> {
        self.roster.iter().map(|(_, actor)| actor.position).collect()
    }

    fn populate(&mut self) -> BrambleResult<()> {
        let config = self.generation_config();
        let player_at = self.player_position();

        let mut enemies = EncounterGenerator::new(
            &self.grid,
            &self.rules.enemies,
            Faction::Enemy,
            self.rules.enemy_count,
        )
        .avoiding(self.occupied_positions());
        if let Some(center) = player_at {
            enemies = enemies.away_from(center, self.rules.enemy_aggro_distance);
        }
        let plans = enemies.generate(&config, &mut self.rng)?;
        self.spawn_plans(plans)?;

        let plans = EncounterGenerator::new(
            &self.grid,
            &self.rules.neutrals,
            Faction::Neutral,
            self.rules.neutral_count,
        )
        .avoiding(self.occupied_positions())
        .generate(&config, &mut self.rng)?;
        self.spawn_plans(plans)?;

        if self.rules.boss_enabled && !self.rules.boss_spawns_after_finale {
            self.spawn_boss();
        }

        let items = ItemGenerator::new(
            &self.grid,
            self.rules.item_count,
            self.rules.item_uses,
            self.rules.potion_amount,
        )
        .avoiding(self.occupied_positions())
        .generate(&config, &mut self.rng)?;
        self.items.extend(items);
        Ok(())
    }

    fn spawn_plans(&mut self, plans: Vec<SpawnPlan>) -> BrambleResult<()> {
        for plan in plans {
            self.spawn_npc(&plan.template, plan.faction, plan.position)?;
        }
        Ok(())
    }

    /// Places an NPC. Enemies spawned this way count towards the initial
    /// enemy total used by the final challenge.
    ///
    /// Out-of-bounds, blocked and occupied positions are rejected with
    /// [`BrambleError::InvalidSpawn`].
    pub fn spawn_npc(
        &mut self,
        template: &ActorTemplate,
        faction: Faction,
        position: Position,
    ) -> BrambleResult<ActorId> {
        let id = self.insert_npc(template, faction, position)?;
        if faction == Faction::Enemy {
            self.initial_enemy_count += 1;
        }
        Ok(id)
    }

    fn insert_npc(
        &mut self,
        template: &ActorTemplate,
        faction: Faction,
        position: Position,
    ) -> BrambleResult<ActorId> {
        if self.outcome.is_game_over() {
            return Err(BrambleError::InvalidState("the game is over".to_string()));
        }
        if faction == Faction::Player {
            return Err(BrambleError::InvalidAction(
                "a session has exactly one player".to_string(),
            ));
        }
        template.validate()?;
        self.check_free(position)?;

        let id = self.roster.insert(Actor::npc(template, faction, position));
        debug!("Spawned {} ({}) at {} as {}", template.name, faction, position, id);
        Ok(id)
    }

    fn check_free(&self, position: Position) -> BrambleResult<()> {
        let reason = if !self.grid.is_valid_position(position) {
            Some("out of bounds")
        } else if !self.grid.can_spawn_at(position) {
            Some("tile does not allow spawning")
        } else if self.roster.living_at(position).is_some() {
            Some("tile is occupied")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(BrambleError::InvalidSpawn {
                x: position.x,
                y: position.y,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Places an item on a free spawnable tile.
    pub fn spawn_item(&mut self, item: ItemStatic) -> BrambleResult<()> {
        if self.outcome.is_game_over() {
            return Err(BrambleError::InvalidState("the game is over".to_string()));
        }
        let position = item.position;
        let reason = if !self.grid.can_spawn_at(position) {
            Some("tile does not allow spawning")
        } else if self.item_at(position).is_some() {
            Some("tile already holds an item")
        } else if item.is_exhausted() {
            Some("item has no uses")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(BrambleError::InvalidSpawn {
                x: position.x,
                y: position.y,
                reason: reason.to_string(),
            });
        }
        self.items.push(item);
        Ok(())
    }

    fn spawn_boss(&mut self) -> bool {
        let config = self.generation_config();
        let occupied = self.occupied_positions();
        let player_at = self.player_position();
        let boss = std::slice::from_ref(&self.rules.boss);

        let mut plans = Vec::new();
        if let Some(center) = player_at {
            plans = EncounterGenerator::new(&self.grid, boss, Faction::Enemy, 1)
                .avoiding(occupied.iter().copied())
                .away_from(center, self.rules.enemy_aggro_distance)
                .generate(&config, &mut self.rng)
                .unwrap_or_default();
        }
        if plans.is_empty() {
            plans = EncounterGenerator::new(&self.grid, boss, Faction::Enemy, 1)
                .avoiding(occupied)
                .generate(&config, &mut self.rng)
                .unwrap_or_default();
        }

        let Some(plan) = plans.pop() else {
            warn!("No free tile left for the boss");
            return false;
        };
        match self.insert_npc(&plan.template, plan.faction, plan.position) {
            Ok(_) => {
                self.boss_spawned = true;
                self.outcome
                    .push_flare(Flare::new(FlareKind::BossArrived, plan.position, 3));
                info!("{} arrives at {}", plan.template.name, plan.position);
                true
            }
            Err(e) => {
                warn!("Could not spawn the boss: {}", e);
                false
            }
        }
    }

    // --- entry points ---

    /// Handles one key press from the player.
    ///
    /// Unbound keys are ignored. Returns the movement result for move keys.
    pub fn player_input(&mut self, key: char, controls: &Controls) -> Option<MoveOutcome> {
        if self.outcome.is_game_over() {
            return None;
        }
        match controls.resolve(key)? {
            PlayerInput::Quit => {
                info!("Player quit");
                self.outcome.record_quit();
                None
            }
            PlayerInput::Move(direction) => Some(self.move_actor(self.player_id, direction)),
            PlayerInput::Fire(direction) => {
                self.fire_projectile(direction);
                None
            }
        }
    }

    /// Tries to step an actor one tile.
    ///
    /// An occupied destination turns into an attack when the mover is the
    /// player and the occupant is of another faction, or when the mover is
    /// an NPC hostile to the occupant's faction. Anything else blocks.
    pub fn move_actor(&mut self, id: ActorId, direction: Direction) -> MoveOutcome {
        if self.outcome.is_game_over() {
            return MoveOutcome::Blocked;
        }
        let (from, faction, is_player) = match self.roster.get(id) {
            Some(actor) if !actor.stats.is_dead() => {
                (actor.position, actor.faction, actor.is_player())
            }
            _ => return MoveOutcome::Blocked,
        };
        let dest = from + direction.to_delta();
        if !self.grid.is_valid_position(dest) {
            return MoveOutcome::Blocked;
        }

        if let Some(occupant) = self.roster.living_at(dest) {
            if !self.wants_to_attack(id, occupant) {
                return MoveOutcome::Blocked;
            }
            return match self.attack(id, occupant) {
                Ok(outcome) => MoveOutcome::Attacked(outcome),
                Err(e) => {
                    debug!("Bump attack by {} failed: {}", id, e);
                    MoveOutcome::Blocked
                }
            };
        }

        if !self.grid.can_move_to(dest) {
            return MoveOutcome::Blocked;
        }
        if let Some(actor) = self.roster.get_mut(id) {
            actor.position = dest;
        }
        self.after_step(id, dest, faction, is_player);
        MoveOutcome::Moved
    }

    fn wants_to_attack(&self, mover: ActorId, occupant: ActorId) -> bool {
        match (self.roster.get(mover), self.roster.get(occupant)) {
            (Some(mover), Some(occupant)) if mover.faction != occupant.faction => {
                mover.is_player() || mover.is_hostile_to(occupant.faction)
            }
            _ => false,
        }
    }

    fn after_step(&mut self, id: ActorId, dest: Position, faction: Faction, is_player: bool) {
        if is_player {
            let range = self
                .roster
                .get(id)
                .map(|actor| actor.stats.vis_range())
                .unwrap_or(0);
            self.grid.reveal_circle(dest, range, true);
        }

        let trap = self
            .grid
            .tile_at(dest)
            .map(|tile| tile.kind)
            .filter(|kind| kind.is_trap());
        if let Some(kind) = trap {
            if !(is_player && self.rules.player_godmode) {
                if let Some(actor) = self.roster.get_mut(id) {
                    let delta = apply_effect(EffectSource::Tile(kind), &actor.stats);
                    let health = delta.apply(&mut actor.stats);
                    debug!("{} stepped on a trap at {} ({} hp left)", actor.name, dest, health);
                    if actor.stats.is_dead() && is_player {
                        info!("Player killed by a trap at {}", dest);
                        self.outcome.record_player_death(Some("trap"));
                    }
                }
            }
        }

        let Some(actor) = self.roster.get_mut(id) else {
            return;
        };
        if actor.stats.is_dead() {
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.position == dest && item.usable_by(faction))
        {
            if item.consume() {
                apply_effect(EffectSource::Item(item.effect), &actor.stats).apply(&mut actor.stats);
                debug!("{} used {:?} at {}", actor.name, item.effect, dest);
            }
        }
    }

    /// Resolves an attack between two actors by handle.
    ///
    /// A surviving NPC target locks onto its attacker. Killing the player
    /// ends the game and records the killer's name.
    pub fn attack(&mut self, attacker: ActorId, target: ActorId) -> BrambleResult<AttackOutcome> {
        if self.outcome.is_game_over() {
            return Ok(AttackOutcome::Aborted);
        }
        let (a, t) = self.roster.get_pair_mut(attacker, target).ok_or_else(|| {
            BrambleError::InvalidAction(format!("{} cannot attack {}", attacker, target))
        })?;

        let outcome = resolve_attack(a, t, &self.rules, &mut self.rng);
        match outcome {
            AttackOutcome::TargetAlive => {
                let (attacker_faction, own_faction) = (a.faction, t.faction);
                if let Some(mind) = t.npc_mind_mut() {
                    mind.set_target_max_aggro(attacker, attacker_faction, own_faction);
                }
            }
            AttackOutcome::TargetKilled if t.is_player() => {
                info!("Player killed by {}", a.name);
                self.outcome.record_player_death(Some(&a.name));
            }
            AttackOutcome::AttackerKilled if a.is_player() => {
                info!("Player killed by {}'s parry", t.name);
                self.outcome.record_player_death(Some(&t.name));
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Launches a projectile from the player. Returns false when the player
    /// is dead or too tired.
    pub fn fire_projectile(&mut self, direction: Direction) -> bool {
        if self.outcome.is_game_over() {
            return false;
        }
        let godmode = self.rules.player_godmode;
        let cost = self.rules.attack_stamina_cost;
        let Some(player) = self.roster.get_mut(self.player_id) else {
            return false;
        };
        if player.stats.is_dead() || (!godmode && player.stats.stamina() < cost) {
            return false;
        }
        if !godmode {
            player.stats.modify_stamina(-cost);
        }

        let damage = roll_damage(player.stats.max_damage(), &mut self.rng) / 2;
        let projectile = Projectile::new(
            self.player_id,
            player.position,
            direction,
            damage,
            self.rules.projectile_range,
        );
        debug!("Player fires {:?} for {} damage", direction, damage);
        self.projectiles.push(projectile);
        true
    }

    fn advance_projectiles(&mut self) {
        let blind_cycles = self.rules.projectile_blind_cycles;
        let godmode = self.rules.player_godmode;
        let mut in_flight = Vec::new();

        for mut projectile in std::mem::take(&mut self.projectiles) {
            let Some(pos) = projectile.advance() else {
                continue;
            };
            match self.roster.living_at(pos) {
                Some(target) if target != projectile.owner => {
                    let shooter_faction = self
                        .roster
                        .get(projectile.owner)
                        .map(|owner| owner.faction)
                        .unwrap_or(Faction::None);
                    let Some(victim) = self.roster.get_mut(target) else {
                        continue;
                    };
                    if victim.is_player() && godmode {
                        continue;
                    }
                    let killed = projectile.strike(victim, shooter_faction, blind_cycles);
                    let (victim_level, victim_name) = (victim.stats.level(), victim.name.clone());
                    let victim_is_player = victim.is_player();
                    if killed {
                        debug!("Projectile killed {} at {}", victim_name, pos);
                        if victim_is_player {
                            self.outcome.record_player_death(Some("projectile"));
                        }
                        if let Some(owner) = self.roster.get_mut(projectile.owner) {
                            owner.award_kill(victim_level);
                        }
                    }
                }
                _ if !self.grid.can_move_to(pos) => {}
                _ => in_flight.push(projectile),
            }
        }
        self.projectiles = in_flight;
    }

    /// Advances projectiles, then gives every living NPC one action.
    pub fn npc_cycle(&mut self) {
        if self.outcome.is_game_over() {
            return;
        }
        self.cycle += 1;
        self.advance_projectiles();

        for id in self.roster.ids() {
            if self.outcome.is_game_over() {
                break;
            }
            self.npc_act(id);
            // blindness counts down after the action it affected
            if let Some(mind) = self.mind_mut(id) {
                mind.tick_blindness();
            }
        }
    }

    fn mind(&self, id: ActorId) -> Option<&NpcMind> {
        self.roster.get(id).and_then(Actor::npc_mind)
    }

    fn mind_mut(&mut self, id: ActorId) -> Option<&mut NpcMind> {
        self.roster.get_mut(id).and_then(Actor::npc_mind_mut)
    }

    fn finale_hunts(&self, faction: Faction) -> bool {
        self.outcome.is_final_challenge()
            && (faction == Faction::Enemy
                || (faction == Faction::Neutral && self.rules.neutrals_hostile_during_finale))
    }

    fn npc_act(&mut self, id: ActorId) {
        let (faction, position, vis_range, aggravated) = match self.roster.get(id) {
            Some(actor) if !actor.stats.is_dead() => match actor.npc_mind() {
                Some(mind) => (
                    actor.faction,
                    actor.position,
                    actor.stats.vis_range(),
                    mind.is_aggravated(),
                ),
                None => return,
            },
            _ => return,
        };

        let blind = self.mind(id).map(NpcMind::is_blind).unwrap_or(false);

        let player = self.player_id;
        if self.finale_hunts(faction) && self.roster.is_alive(player) {
            if let Some(actor) = self.roster.get_mut(id) {
                actor.set_relationship(Faction::Player, true);
                if let Some(mind) = actor.npc_mind_mut() {
                    mind.set_target_max_aggro(player, Faction::Player, faction);
                }
            }
            self.pursue(id);
            return;
        }

        if !blind {
            let bonus = if aggravated {
                self.rules.npc_vis_aggro_modifier
            } else {
                0
            };
            if let Some((target, target_faction)) =
                self.visible_hostile(id, position, vis_range.saturating_add(bonus))
            {
                if let Some(mind) = self.mind_mut(id) {
                    mind.set_target_max_aggro(target, target_faction, faction);
                }
                self.pursue(id);
                return;
            }
        }

        let target_alive = self
            .mind(id)
            .and_then(NpcMind::target)
            .map(|target| self.roster.is_alive(target))
            .unwrap_or(false);
        let has_target = self
            .mind_mut(id)
            .map(|mind| mind.has_target(|_| target_alive))
            .unwrap_or(false);
        if has_target {
            let remaining = self
                .mind_mut(id)
                .map(NpcMind::decay_aggression)
                .unwrap_or(0);
            if remaining > 0 {
                self.pursue(id);
            }
            return;
        }

        let idle_chance = self.rules.npc_move_chance.clamp(0.0, 1.0);
        if self.rng.gen_bool(idle_chance) {
            let directions = Direction::all();
            if let Some(&direction) = directions.choose(&mut self.rng) {
                self.move_actor(id, direction);
            }
        }
    }

    /// The hostile actor an NPC sees: its current target when in range,
    /// otherwise the nearest one.
    fn visible_hostile(
        &self,
        id: ActorId,
        position: Position,
        range: i32,
    ) -> Option<(ActorId, Faction)> {
        let npc = self.roster.get(id)?;
        let current = npc.npc_mind().and_then(NpcMind::target);
        let range_sq = (range.max(0) as i64).pow(2);

        let mut seen: Vec<(ActorId, Faction, i64)> = self
            .roster
            .iter()
            .filter(|(other, actor)| {
                *other != id
                    && !actor.stats.is_dead()
                    && actor.faction != npc.faction
                    && (npc.is_hostile_to(actor.faction) || Some(*other) == current)
            })
            .map(|(other, actor)| (other, actor.faction, actor.distance_squared_to(position)))
            .filter(|&(_, _, dist)| dist <= range_sq)
            .collect();

        if let Some(&(target, faction, _)) = seen.iter().find(|(other, _, _)| Some(*other) == current) {
            return Some((target, faction));
        }
        seen.sort_by_key(|&(_, _, dist)| dist);
        seen.first().map(|&(target, faction, _)| (target, faction))
    }

    fn step_blocked(&self, id: ActorId, dest: Position) -> bool {
        if !self.grid.can_move_to(dest) {
            return true;
        }
        match self.roster.living_at(dest) {
            Some(occupant) if occupant != id => !self.wants_to_attack(id, occupant),
            _ => false,
        }
    }

    /// Steps toward the NPC's target, or away from it when afraid.
    fn pursue(&mut self, id: ActorId) {
        let aggro_chance = self.rules.npc_move_chance_aggro.clamp(0.0, 1.0);
        if !self.rng.gen_bool(aggro_chance) {
            return;
        }
        let (position, afraid, target) = match self.roster.get(id) {
            Some(actor) => match actor.npc_mind() {
                Some(mind) => (actor.position, mind.is_afraid(&actor.stats), mind.target()),
                None => return,
            },
            None => return,
        };
        let target_at = match target.and_then(|target| self.roster.get(target)) {
            Some(target) => target.position,
            None => return,
        };
        let primary = match direction_to(target_at - position, afraid) {
            Some(direction) => direction,
            None => return,
        };

        let clockwise_first = self.rng.gen_bool(0.5);
        for direction in steering_candidates(primary, clockwise_first) {
            if !self.step_blocked(id, position + direction.to_delta()) {
                self.move_actor(id, direction);
                return;
            }
        }
    }

    /// Passive regeneration; NPCs regenerate twice as fast.
    pub fn apply_passive_regen(&mut self) {
        if self.outcome.is_game_over() {
            return;
        }
        let (health, stamina) = (self.rules.regen_health, self.rules.regen_stamina);
        for id in self.roster.ids() {
            if let Some(actor) = self.roster.get_mut(id) {
                if actor.stats.is_dead() {
                    continue;
                }
                let factor = if actor.is_player() { 1 } else { 2 };
                actor.stats.modify_health(health.saturating_mul(factor));
                actor.stats.modify_stamina(stamina.saturating_mul(factor));
            }
        }
    }

    /// Levels up every actor whose kills reach the threshold, one level per call.
    pub fn apply_level_ups(&mut self) {
        if self.outcome.is_game_over() {
            return;
        }
        for id in self.roster.ids() {
            let Some(actor) = self.roster.get_mut(id) else {
                continue;
            };
            if actor.stats.is_dead()
                || actor.kill_count < kills_for_next_level(actor.stats.level(), &self.rules)
            {
                continue;
            }
            let level = actor.stats.add_level();
            if actor.is_player() {
                actor.stats.restore_percent(self.rules.level_up_restore_percent);
                self.outcome.push_flare(Flare::new(
                    FlareKind::LevelUp,
                    actor.position,
                    actor.stats.vis_range(),
                ));
                info!("Player reached level {}", level);
            } else {
                debug!("{} reached level {}", actor.name, level);
            }
        }
    }

    /// End-of-cycle sweep: exhausted items, dead NPCs, and the win, loss
    /// and finale checks.
    pub fn cleanup(&mut self) {
        if self.outcome.is_game_over() {
            return;
        }
        self.items.retain(|item| !item.is_exhausted());

        let dead: Vec<ActorId> = self
            .roster
            .iter()
            .filter(|(_, actor)| !actor.is_player() && actor.stats.is_dead())
            .map(|(id, _)| id)
            .collect();
        for &id in &dead {
            if let Some(actor) = self.roster.remove(id) {
                debug!("Removed {} from {}", actor.name, actor.position);
            }
        }
        if !dead.is_empty() {
            for id in self.roster.ids() {
                if let Some(mind) = self.mind_mut(id) {
                    for &removed in &dead {
                        mind.forget(removed);
                    }
                }
            }
            self.projectiles.retain(|p| self.roster.contains(p.owner));
        }

        if !self.roster.is_alive(self.player_id) {
            info!("Game over: player is dead");
            self.outcome.record_player_death(None);
            return;
        }

        let enemies = self.living_count(Faction::Enemy);
        let initial = self.initial_enemy_count;
        let trigger = self.rules.final_challenge_trigger_percent as usize;
        if initial > 0
            && enemies * 100 <= initial * trigger
            && self.outcome.trigger_final_challenge()
        {
            info!("Final challenge: {} of {} enemies left", enemies, initial);
            if let Some(at) = self.player_position() {
                self.outcome
                    .push_flare(Flare::new(FlareKind::FinalChallenge, at, 5));
            }
        }

        if enemies > 0 || (initial == 0 && !self.boss_spawned) {
            return;
        }
        if self.rules.boss_enabled
            && self.rules.boss_spawns_after_finale
            && !self.boss_spawned
            && self.spawn_boss()
        {
            self.outcome.trigger_final_challenge();
            return;
        }

        info!("Victory: all enemies are dead");
        if let Some(at) = self.player_position() {
            self.outcome.push_flare(Flare::new(FlareKind::Victory, at, 7));
        }
        self.outcome.record_victory();
    }

    // --- queries ---

    pub fn tile_at(&self, pos: Position) -> Option<&Tile> {
        self.grid.tile_at(pos)
    }

    /// The living actor on `pos`.
    pub fn actor_at(&self, pos: Position) -> Option<&Actor> {
        self.roster.living_at(pos).and_then(|id| self.roster.get(id))
    }

    pub fn actor_id_at(&self, pos: Position) -> Option<ActorId> {
        self.roster.living_at(pos)
    }

    /// The usable item on `pos`.
    pub fn item_at(&self, pos: Position) -> Option<&ItemStatic> {
        self.items
            .iter()
            .find(|item| item.position == pos && !item.is_exhausted())
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.roster.get(id)
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.roster.iter()
    }

    pub fn items(&self) -> &[ItemStatic] {
        &self.items
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_size(&self) -> (u32, u32) {
        self.grid.size()
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Shared handle to the outcome flags.
    pub fn outcome(&self) -> Arc<GameOutcome> {
        Arc::clone(&self.outcome)
    }

    pub fn active_flare(&self) -> Option<Flare> {
        self.outcome.active_flare()
    }

    pub fn player(&self) -> Option<&Actor> {
        self.roster.get(self.player_id)
    }

    pub fn player_id(&self) -> ActorId {
        self.player_id
    }

    fn player_position(&self) -> Option<Position> {
        self.player().map(|player| player.position)
    }

    pub fn initial_enemy_count(&self) -> usize {
        self.initial_enemy_count
    }

    pub fn boss_spawned(&self) -> bool {
        self.boss_spawned
    }

    /// NPC cycles run so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Living actors of a faction.
    pub fn living_count(&self, faction: Faction) -> usize {
        self.roster
            .iter()
            .filter(|(_, actor)| actor.faction == faction && !actor.stats.is_dead())
            .count()
    }

    /// Copies what the renderer needs into an owned frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        let (width, height) = self.grid.size();
        let mut cells: Vec<Vec<char>> = (0..height as i32)
            .map(|y| {
                (0..width as i32)
                    .map(|x| {
                        let pos = Position::new(x, y);
                        match self.grid.tile_at(pos) {
                            Some(tile) if self.grid.is_known(pos) => tile.glyph,
                            _ => ' ',
                        }
                    })
                    .collect()
            })
            .collect();

        let mut put = |pos: Position, glyph: char, always: bool| {
            if always || self.grid.is_known(pos) {
                if let Some(cell) = cells
                    .get_mut(pos.y as usize)
                    .and_then(|row| row.get_mut(pos.x as usize))
                {
                    *cell = glyph;
                }
            }
        };
        for item in self.items.iter().filter(|item| !item.is_exhausted()) {
            put(item.position, item.glyph, false);
        }
        for projectile in &self.projectiles {
            put(projectile.position, crate::Displayable::glyph(projectile), false);
        }
        for (_, actor) in self.roster.iter().filter(|(_, actor)| !actor.stats.is_dead()) {
            put(actor.position, actor.glyph, actor.is_player());
        }

        FrameSnapshot {
            width,
            height,
            rows: cells.into_iter().map(|row| row.into_iter().collect()).collect(),
            player: self.player().map(PlayerStatus::from_actor),
            outcome: self.outcome.snapshot(),
            flare: self.outcome.active_flare(),
            cycle: self.cycle,
        }
    }
}

/// Player stats as shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub name: String,
    pub position: Position,
    pub level: u32,
    pub health: i32,
    pub max_health: i32,
    pub stamina: i32,
    pub max_stamina: i32,
    pub kills: u32,
}

impl PlayerStatus {
    fn from_actor(actor: &Actor) -> Self {
        Self {
            name: actor.name.clone(),
            position: actor.position,
            level: actor.stats.level(),
            health: actor.stats.health(),
            max_health: actor.stats.max_health(),
            stamina: actor.stats.stamina(),
            max_stamina: actor.stats.max_stamina(),
            kills: actor.kill_count,
        }
    }
}

/// An owned copy of one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub width: u32,
    pub height: u32,
    /// One string of glyphs per grid row
    pub rows: Vec<String>,
    pub player: Option<PlayerStatus>,
    pub outcome: OutcomeSnapshot,
    pub flare: Option<Flare>,
    pub cycle: u64,
}

impl FrameSnapshot {
    /// Glyph at a position; blank outside the frame.
    pub fn glyph_at(&self, pos: Position) -> char {
        if pos.x < 0 || pos.y < 0 {
            return ' ';
        }
        self.rows
            .get(pos.y as usize)
            .and_then(|row| row.chars().nth(pos.x as usize))
            .unwrap_or(' ')
    }
}

impl fmt::Display for FrameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        if let Some(player) = &self.player {
            write!(
                f,
                "HP {}/{}  ST {}/{}  LV {}  Kills {}",
                player.health,
                player.max_health,
                player.stamina,
                player.max_stamina,
                player.level,
                player.kills
            )?;
        }
        if self.outcome.all_enemies_dead {
            write!(f, "\nVictory!")?;
        } else if self.outcome.player_dead {
            match &self.outcome.killed_by {
                Some(killer) => write!(f, "\nKilled by {}", killer)?,
                None => write!(f, "\nYou died")?,
            }
        } else if self.outcome.player_quit {
            write!(f, "\nQuit")?;
        } else if self.outcome.final_challenge {
            write!(f, "\nFinal challenge!")?;
        }
        Ok(())
    }
}
