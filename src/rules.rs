//! # Game Rules
//!
//! Read-only numeric knobs and actor templates consumed by the simulation.
//!
//! Rules are plain serde data. Every field has a default, so a rules file only
//! needs to name the options it changes:
//!
//! ```
//! use bramble::GameRules;
//!
//! let rules = GameRules::from_json_str(r#"{ "enemy_count": 2, "player_godmode": true }"#).unwrap();
//! assert_eq!(rules.enemy_count, 2);
//! assert!(rules.player_godmode);
//! assert_eq!(rules.grid_width, GameRules::default().grid_width);
//! ```

use crate::config;
use crate::{BrambleError, BrambleResult, Color, Faction};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-species stat block used to spawn actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorTemplate {
    pub name: String,
    pub level: u32,
    pub health: i32,
    pub stamina: i32,
    pub damage: i32,
    pub vis_range: i32,
    pub glyph: char,
    pub color: Color,
    /// Factions this species starts out hostile to
    pub hostile_to: Vec<Faction>,
    /// Aggression an NPC of this species starts counting down from
    pub max_aggression: i32,
    /// Relative weight when picking a species to spawn
    pub spawn_chance: f64,
}

impl Default for ActorTemplate {
    fn default() -> Self {
        Self {
            name: "Creature".to_string(),
            level: 1,
            health: 20,
            stamina: 20,
            damage: 6,
            vis_range: 5,
            glyph: 'c',
            color: Color::Default,
            hostile_to: Vec::new(),
            max_aggression: 8,
            spawn_chance: 1.0,
        }
    }
}

impl ActorTemplate {
    /// The default player template.
    pub fn player() -> Self {
        Self {
            name: "Player".to_string(),
            level: 1,
            health: 100,
            stamina: 60,
            damage: 18,
            vis_range: 7,
            glyph: '@',
            color: Color::Yellow,
            hostile_to: vec![Faction::Enemy],
            max_aggression: 0,
            spawn_chance: 1.0,
        }
    }

    /// The default boss template.
    pub fn boss() -> Self {
        Self {
            name: "Troll".to_string(),
            level: 3,
            health: 160,
            stamina: 80,
            damage: 24,
            vis_range: 9,
            glyph: 'T',
            color: Color::Magenta,
            hostile_to: vec![Faction::Player, Faction::Neutral],
            max_aggression: 40,
            spawn_chance: 1.0,
        }
    }

    fn default_enemies() -> Vec<Self> {
        vec![
            Self {
                name: "Goblin".to_string(),
                level: 1,
                health: 30,
                stamina: 30,
                damage: 10,
                vis_range: 6,
                glyph: 'g',
                color: Color::Green,
                hostile_to: vec![Faction::Player],
                max_aggression: 12,
                spawn_chance: 0.6,
            },
            Self {
                name: "Orc".to_string(),
                level: 2,
                health: 50,
                stamina: 40,
                damage: 14,
                vis_range: 5,
                glyph: 'o',
                color: Color::Red,
                hostile_to: vec![Faction::Player],
                max_aggression: 16,
                spawn_chance: 0.4,
            },
        ]
    }

    fn default_neutrals() -> Vec<Self> {
        vec![Self {
            name: "Rat".to_string(),
            level: 1,
            health: 12,
            stamina: 20,
            damage: 4,
            vis_range: 4,
            glyph: 'r',
            color: Color::Gray,
            hostile_to: Vec::new(),
            max_aggression: 6,
            spawn_chance: 1.0,
        }]
    }

    /// Checks the template for values the simulation cannot work with.
    pub fn validate(&self) -> BrambleResult<()> {
        let problem = if self.name.trim().is_empty() {
            Some("name must not be empty".to_string())
        } else if self.level == 0 {
            Some("level must be at least 1".to_string())
        } else if self.health <= 0 {
            Some(format!("health must be positive, got {}", self.health))
        } else if self.stamina < 0 || self.damage < 0 || self.vis_range < 0 {
            Some("stamina, damage and vis_range must not be negative".to_string())
        } else if self.vis_range > config::MAX_VIS_RANGE {
            Some(format!(
                "vis_range must be <= {}, got {}",
                config::MAX_VIS_RANGE,
                self.vis_range
            ))
        } else if self.max_aggression < 0 {
            Some("max_aggression must not be negative".to_string())
        } else if !(self.spawn_chance >= 0.0) {
            Some(format!("spawn_chance must be >= 0, got {}", self.spawn_chance))
        } else {
            None
        };

        match problem {
            Some(reason) => Err(BrambleError::InvalidConfig(format!(
                "template '{}': {}",
                self.name, reason
            ))),
            None => Ok(()),
        }
    }
}

/// Every tunable of a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Wall tiles bypass fog of war
    pub walls_always_visible: bool,
    /// Disables fog of war entirely
    pub reveal_all_tiles: bool,
    pub wall_chance: f64,
    pub trap_chance: f64,
    pub trap_damage: i32,
    pub trap_damage_is_percent: bool,

    pub attack_stamina_cost: i32,
    pub attack_block_chance: f64,
    pub attack_miss_chance_full: f64,
    pub attack_miss_chance_drained: f64,

    pub npc_move_chance: f64,
    pub npc_move_chance_aggro: f64,
    /// Extra sight range while an NPC is aggravated
    pub npc_vis_aggro_modifier: i32,
    pub npc_interval_ms: u64,

    pub regen_interval_ms: u64,
    pub regen_health: i32,
    pub regen_stamina: i32,

    pub level_up_kill_threshold: u32,
    pub level_up_threshold_multiplier: f64,
    pub level_up_restore_percent: i32,

    pub enemy_count: u32,
    pub neutral_count: u32,
    /// Minimum spawn distance between enemies and the player
    pub enemy_aggro_distance: i32,
    pub item_count: u32,
    pub item_uses: u32,
    pub potion_amount: i32,

    /// Surviving share of the initial enemies (percent) that starts the finale
    pub final_challenge_trigger_percent: u32,
    pub neutrals_hostile_during_finale: bool,
    pub boss_enabled: bool,
    pub boss_spawns_after_finale: bool,

    pub player_godmode: bool,

    pub projectile_range: u32,
    pub projectile_blind_cycles: u32,

    pub player: ActorTemplate,
    pub enemies: Vec<ActorTemplate>,
    pub neutrals: Vec<ActorTemplate>,
    pub boss: ActorTemplate,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            grid_width: config::DEFAULT_GRID_WIDTH,
            grid_height: config::DEFAULT_GRID_HEIGHT,
            walls_always_visible: true,
            reveal_all_tiles: false,
            wall_chance: config::DEFAULT_WALL_CHANCE,
            trap_chance: config::DEFAULT_TRAP_CHANCE,
            trap_damage: 10,
            trap_damage_is_percent: false,
            attack_stamina_cost: 12,
            attack_block_chance: 0.3,
            attack_miss_chance_full: 0.05,
            attack_miss_chance_drained: 0.25,
            npc_move_chance: 0.4,
            npc_move_chance_aggro: 0.9,
            npc_vis_aggro_modifier: 3,
            npc_interval_ms: 350,
            regen_interval_ms: 2000,
            regen_health: 1,
            regen_stamina: 3,
            level_up_kill_threshold: 3,
            level_up_threshold_multiplier: 1.5,
            level_up_restore_percent: 50,
            enemy_count: 8,
            neutral_count: 4,
            enemy_aggro_distance: 8,
            item_count: 5,
            item_uses: 1,
            potion_amount: 25,
            final_challenge_trigger_percent: 25,
            neutrals_hostile_during_finale: false,
            boss_enabled: true,
            boss_spawns_after_finale: true,
            player_godmode: false,
            projectile_range: 8,
            projectile_blind_cycles: 3,
            player: ActorTemplate::player(),
            enemies: ActorTemplate::default_enemies(),
            neutrals: ActorTemplate::default_neutrals(),
            boss: ActorTemplate::boss(),
        }
    }
}

impl GameRules {
    /// Rules for a small deterministic arena: no fog, no randomness in
    /// combat rolls beyond damage, no idle wandering.
    pub fn for_testing() -> Self {
        Self {
            grid_width: 12,
            grid_height: 12,
            reveal_all_tiles: true,
            wall_chance: 0.0,
            trap_chance: 0.0,
            attack_block_chance: 0.0,
            attack_miss_chance_full: 0.0,
            attack_miss_chance_drained: 0.0,
            npc_move_chance: 0.0,
            npc_move_chance_aggro: 1.0,
            enemy_count: 0,
            neutral_count: 0,
            item_count: 0,
            boss_enabled: false,
            ..Self::default()
        }
    }

    /// Parses rules from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> BrambleResult<Self> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Loads rules from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> BrambleResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text).map_err(|e| {
            warn!("Rejected rules file {}: {}", path.as_ref().display(), e);
            e
        })
    }

    /// Saves the rules as pretty JSON.
    pub fn to_json(&self) -> BrambleResult<String> {
        serde_json::to_string_pretty(self).map_err(BrambleError::from)
    }

    /// Fails fast on values that would leave the simulation degenerate.
    pub fn validate(&self) -> BrambleResult<()> {
        if self.grid_width < config::MIN_GRID_SIZE || self.grid_height < config::MIN_GRID_SIZE {
            return Err(BrambleError::InvalidConfig(format!(
                "grid must be at least {0}x{0}, got {1}x{2}",
                config::MIN_GRID_SIZE,
                self.grid_width,
                self.grid_height
            )));
        }
        if self.grid_width > config::MAX_GRID_SIZE || self.grid_height > config::MAX_GRID_SIZE {
            return Err(BrambleError::InvalidConfig(format!(
                "grid must be at most {0}x{0}, got {1}x{2}",
                config::MAX_GRID_SIZE,
                self.grid_width,
                self.grid_height
            )));
        }
        if !(0..=config::MAX_VIS_RANGE).contains(&self.npc_vis_aggro_modifier) {
            return Err(BrambleError::InvalidConfig(format!(
                "npc_vis_aggro_modifier must be within [0, {}], got {}",
                config::MAX_VIS_RANGE,
                self.npc_vis_aggro_modifier
            )));
        }

        let chances = [
            ("wall_chance", self.wall_chance),
            ("trap_chance", self.trap_chance),
            ("attack_block_chance", self.attack_block_chance),
            ("attack_miss_chance_full", self.attack_miss_chance_full),
            ("attack_miss_chance_drained", self.attack_miss_chance_drained),
            ("npc_move_chance", self.npc_move_chance),
            ("npc_move_chance_aggro", self.npc_move_chance_aggro),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(BrambleError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.wall_chance + self.trap_chance > 1.0 {
            return Err(BrambleError::InvalidConfig(
                "wall_chance + trap_chance must not exceed 1".to_string(),
            ));
        }

        if self.attack_stamina_cost < 0 || self.trap_damage < 0 {
            return Err(BrambleError::InvalidConfig(
                "attack_stamina_cost and trap_damage must not be negative".to_string(),
            ));
        }
        if self.level_up_kill_threshold == 0 || !(self.level_up_threshold_multiplier > 0.0) {
            return Err(BrambleError::InvalidConfig(
                "level-up threshold and multiplier must be positive".to_string(),
            ));
        }
        if self.final_challenge_trigger_percent > 100 {
            return Err(BrambleError::InvalidConfig(format!(
                "final_challenge_trigger_percent must be <= 100, got {}",
                self.final_challenge_trigger_percent
            )));
        }

        self.player.validate()?;
        if self.boss_enabled {
            self.boss.validate()?;
        }
        for (count, templates, kind) in [
            (self.enemy_count, &self.enemies, "enemy"),
            (self.neutral_count, &self.neutrals, "neutral"),
        ] {
            if count > 0 && templates.is_empty() {
                return Err(BrambleError::InvalidConfig(format!(
                    "{} {} actors requested but no templates given",
                    count, kind
                )));
            }
            for template in templates {
                template.validate()?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_rules_are_valid() {
        assert!(GameRules::default().validate().is_ok());
        assert!(GameRules::for_testing().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let rules = GameRules::from_json_str(
            r#"{ "grid_width": 20, "enemies": [{ "name": "Bat", "glyph": "b", "hostile_to": ["player"] }] }"#,
        )
        .unwrap();
        assert_eq!(rules.grid_width, 20);
        assert_eq!(rules.grid_height, config::DEFAULT_GRID_HEIGHT);
        assert_eq!(rules.enemies.len(), 1);
        assert_eq!(rules.enemies[0].glyph, 'b');
        assert_eq!(rules.enemies[0].health, ActorTemplate::default().health);
        assert_eq!(rules.enemies[0].hostile_to, vec![Faction::Player]);
    }

    #[test]
    fn test_tiny_grid_is_rejected() {
        let result = GameRules::from_json_str(r#"{ "grid_width": 9 }"#);
        assert!(matches!(result, Err(BrambleError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_grid_and_sight_are_rejected() {
        let result = GameRules::from_json_str(r#"{ "grid_height": 100000 }"#);
        assert!(matches!(result, Err(BrambleError::InvalidConfig(_))));

        let rules = GameRules {
            npc_vis_aggro_modifier: i32::MAX,
            ..GameRules::default()
        };
        assert!(rules.validate().is_err());

        let mut rules = GameRules::default();
        rules.enemies[0].vis_range = i32::MAX;
        assert!(rules.validate().is_err());
        rules.enemies[0].vis_range = config::MAX_VIS_RANGE;
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_bad_chance_is_rejected() {
        let rules = GameRules {
            attack_block_chance: 1.5,
            ..GameRules::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_malformed_template_is_rejected() {
        let mut rules = GameRules::default();
        rules.enemies[0].health = 0;
        assert!(rules.validate().is_err());

        let mut rules = GameRules::default();
        rules.enemies.clear();
        assert!(rules.validate().is_err());
        rules.enemy_count = 0;
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_serde_error() {
        let result = GameRules::from_json_str("{ not json");
        assert!(matches!(result, Err(BrambleError::Serde(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "regen_health": 7 }}"#).unwrap();
        let rules = GameRules::load(file.path()).unwrap();
        assert_eq!(rules.regen_health, 7);

        assert!(matches!(
            GameRules::load(file.path().with_extension("missing")),
            Err(BrambleError::Io(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let rules = GameRules::default();
        let json = rules.to_json().unwrap();
        assert_eq!(GameRules::from_json_str(&json).unwrap(), rules);
    }
}
