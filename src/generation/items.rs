//! # Item Generation
//!
//! Scatters potions over free tiles.

use crate::generation::utils;
use crate::{
    BrambleError, BrambleResult, GenerationConfig, Generator, Grid, ItemEffect, ItemStatic,
    Position,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Places health and stamina potions on free spawnable tiles.
pub struct ItemGenerator<'a> {
    grid: &'a Grid,
    count: u32,
    uses: u32,
    amount: i32,
    occupied: HashSet<Position>,
}

impl<'a> ItemGenerator<'a> {
    pub fn new(grid: &'a Grid, count: u32, uses: u32, amount: i32) -> Self {
        Self {
            grid,
            count,
            uses,
            amount,
            occupied: HashSet::new(),
        }
    }

    pub fn avoiding(mut self, occupied: impl IntoIterator<Item = Position>) -> Self {
        self.occupied.extend(occupied);
        self
    }
}

impl Generator<Vec<ItemStatic>> for ItemGenerator<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> BrambleResult<Vec<ItemStatic>> {
        let mut candidates = utils::free_spawn_positions(self.grid, &self.occupied, None);
        candidates.shuffle(rng);

        let items: Vec<ItemStatic> = candidates
            .into_iter()
            .take(self.count as usize)
            .map(|position| {
                let effect = if rng.gen_bool(0.5) {
                    ItemEffect::RestoreHealth(self.amount)
                } else {
                    ItemEffect::RestoreStamina(self.amount)
                };
                ItemStatic::new(position, effect, self.uses)
            })
            .collect();

        self.validate(&items, config)?;
        Ok(items)
    }

    fn validate(&self, items: &Vec<ItemStatic>, _config: &GenerationConfig) -> BrambleResult<()> {
        match items.iter().find(|item| item.is_exhausted()) {
            Some(item) => Err(BrambleError::InvalidSpawn {
                x: item.position.x,
                y: item.position.y,
                reason: "item has no uses".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn generator_type(&self) -> &'static str {
        "ItemGenerator"
    }
}
