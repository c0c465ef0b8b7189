//! # Encounter Generation
//!
//! Picks species and free tiles for a batch of NPCs.

use crate::generation::utils;
use crate::{
    ActorTemplate, BrambleError, BrambleResult, Faction, GenerationConfig, Generator, Grid,
    Position,
};
use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// One NPC the simulation should spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    pub template: ActorTemplate,
    pub faction: Faction,
    pub position: Position,
}

/// Places up to `count` NPCs of one faction on free spawnable tiles.
///
/// Species are picked by `spawn_chance` weight.
pub struct EncounterGenerator<'a> {
    grid: &'a Grid,
    templates: &'a [ActorTemplate],
    faction: Faction,
    count: u32,
    occupied: HashSet<Position>,
    keep_away: Option<(Position, i32)>,
}

impl<'a> EncounterGenerator<'a> {
    pub fn new(grid: &'a Grid, templates: &'a [ActorTemplate], faction: Faction, count: u32) -> Self {
        Self {
            grid,
            templates,
            faction,
            count,
            occupied: HashSet::new(),
            keep_away: None,
        }
    }

    /// Positions that are already taken.
    pub fn avoiding(mut self, occupied: impl IntoIterator<Item = Position>) -> Self {
        self.occupied.extend(occupied);
        self
    }

    /// Keeps every spawn at least `distance` tiles from `center`.
    pub fn away_from(mut self, center: Position, distance: i32) -> Self {
        self.keep_away = Some((center, distance));
        self
    }

    fn pick_template(&self, rng: &mut StdRng) -> Option<&'a ActorTemplate> {
        match WeightedIndex::new(self.templates.iter().map(|t| t.spawn_chance)) {
            Ok(weights) => self.templates.get(weights.sample(rng)),
            // every weight is zero
            Err(_) => self.templates.get(rng.gen_range(0..self.templates.len())),
        }
    }
}

impl Generator<Vec<SpawnPlan>> for EncounterGenerator<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> BrambleResult<Vec<SpawnPlan>> {
        if self.count == 0 {
            return Ok(Vec::new());
        }
        if self.templates.is_empty() {
            return Err(BrambleError::InvalidConfig(format!(
                "no templates to spawn {} {} actors",
                self.count, self.faction
            )));
        }

        let mut candidates = utils::free_spawn_positions(self.grid, &self.occupied, self.keep_away);
        candidates.shuffle(rng);
        if candidates.len() < self.count as usize {
            warn!(
                "Only {} free tiles for {} {} actors",
                candidates.len(),
                self.count,
                self.faction
            );
        }

        let mut plans = Vec::new();
        for position in candidates.into_iter().take(self.count as usize) {
            if let Some(template) = self.pick_template(rng) {
                plans.push(SpawnPlan {
                    template: template.clone(),
                    faction: self.faction,
                    position,
                });
            }
        }

        self.validate(&plans, config)?;
        Ok(plans)
    }

    fn validate(&self, plans: &Vec<SpawnPlan>, _config: &GenerationConfig) -> BrambleResult<()> {
        let mut seen = HashSet::new();
        for plan in plans {
            if !self.grid.can_spawn_at(plan.position) || !seen.insert(plan.position) {
                return Err(BrambleError::InvalidSpawn {
                    x: plan.position.x,
                    y: plan.position.y,
                    reason: "tile is blocked or taken twice".to_string(),
                });
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "EncounterGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrapDamage;

    fn arena() -> Grid {
        Grid::import_from(
            &["##########", "#........#", "#........#", "#........#", "##########"],
            false,
            true,
            TrapDamage::Flat(1),
        )
        .unwrap()
    }

    #[test]
    fn test_spawns_are_distinct_and_far_enough() {
        let grid = arena();
        let templates = vec![ActorTemplate::default()];
        let player = Position::new(1, 1);
        let config = GenerationConfig::for_testing(4);
        let mut rng = utils::create_rng(&config);

        let plans = EncounterGenerator::new(&grid, &templates, Faction::Enemy, 5)
            .avoiding([player])
            .away_from(player, 4)
            .generate(&config, &mut rng)
            .unwrap();

        assert_eq!(plans.len(), 5);
        let unique: HashSet<_> = plans.iter().map(|p| p.position).collect();
        assert_eq!(unique.len(), 5);
        for plan in &plans {
            assert!(plan.position.distance_squared(player) >= 16);
            assert_eq!(plan.faction, Faction::Enemy);
        }
    }

    #[test]
    fn test_weighting_skips_zero_chance_species() {
        let grid = arena();
        let templates = vec![
            ActorTemplate {
                name: "Never".to_string(),
                spawn_chance: 0.0,
                ..ActorTemplate::default()
            },
            ActorTemplate {
                name: "Always".to_string(),
                spawn_chance: 1.0,
                ..ActorTemplate::default()
            },
        ];
        let config = GenerationConfig::for_testing(11);
        let mut rng = utils::create_rng(&config);
        let plans = EncounterGenerator::new(&grid, &templates, Faction::Neutral, 10)
            .generate(&config, &mut rng)
            .unwrap();
        assert!(plans.iter().all(|p| p.template.name == "Always"));
    }

    #[test]
    fn test_crowded_grid_spawns_fewer() {
        let grid = arena();
        let templates = vec![ActorTemplate::default()];
        let config = GenerationConfig::for_testing(2);
        let mut rng = utils::create_rng(&config);
        let plans = EncounterGenerator::new(&grid, &templates, Faction::Enemy, 100)
            .generate(&config, &mut rng)
            .unwrap();
        assert_eq!(plans.len(), 24);
    }

    #[test]
    fn test_missing_templates_is_config_error() {
        let grid = arena();
        let config = GenerationConfig::for_testing(2);
        let mut rng = utils::create_rng(&config);
        let result = EncounterGenerator::new(&grid, &[], Faction::Enemy, 1).generate(&config, &mut rng);
        assert!(matches!(result, Err(BrambleError::InvalidConfig(_))));
    }
}
