//! Integration test to ensure a game can start up without errors.

use bramble::{
    BrambleError, BrambleResult, Faction, GameRules, Grid, Position, Simulation, TileKind,
    TrapDamage,
};
use std::io::Write;

#[test]
fn test_basic_startup() -> BrambleResult<()> {
    let rules = GameRules::default();
    let sim = Simulation::new(rules.clone(), 12345)?;

    // The grid matches the configured size and has a wall ring
    let (width, height) = sim.grid_size();
    assert_eq!((width, height), (rules.grid_width, rules.grid_height));
    for pos in sim.grid().positions().filter(|&p| sim.grid().is_edge(p)) {
        assert_eq!(sim.tile_at(pos).map(|t| t.kind), Some(TileKind::Wall));
    }

    // The player stands on a walkable tile and sees its surroundings
    let player = sim.player().expect("player spawned");
    assert!(sim.grid().can_move_to(player.position));
    assert!(sim.grid().is_known(player.position));

    // Everyone got a tile of their own
    assert_eq!(sim.living_count(Faction::Enemy), rules.enemy_count as usize);
    assert_eq!(sim.living_count(Faction::Neutral), rules.neutral_count as usize);
    for (id, actor) in sim.actors() {
        assert_eq!(sim.actor_id_at(actor.position), Some(id));
    }

    // Nothing has ended yet
    assert!(!sim.outcome().is_game_over());
    assert!(sim.active_flare().is_none());
    Ok(())
}

#[test]
fn test_startup_from_imported_grid() -> BrambleResult<()> {
    let lines = ["##########", "#........#", "#..^.....#", "#...+..=.#", "##########"];
    let grid = Grid::import_from(&lines, true, false, TrapDamage::Percent(20))?;
    let sim = Simulation::with_grid(grid, GameRules::for_testing(), 1, Position::new(1, 1))?;

    assert_eq!(sim.grid_size(), (10, 5));
    assert!(sim.grid().is_trap(Position::new(3, 2)));
    assert_eq!(sim.actors().count(), 1);
    Ok(())
}

#[test]
fn test_player_cannot_start_in_a_wall() {
    let grid = Grid::import_from(&["#####", "#...#", "#####"], false, true, TrapDamage::Flat(1)).unwrap();
    let result = Simulation::with_grid(grid, GameRules::for_testing(), 1, Position::new(0, 0));
    assert!(matches!(result, Err(BrambleError::InvalidSpawn { x: 0, y: 0, .. })));
}

#[test]
fn test_startup_from_rules_file() -> BrambleResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "grid_width": 20, "grid_height": 12, "enemy_count": 2, "neutral_count": 1, "reveal_all_tiles": true }}"#
    )?;

    let rules = GameRules::load(file.path())?;
    let sim = Simulation::new(rules, 7)?;
    assert_eq!(sim.grid_size(), (20, 12));
    assert_eq!(sim.initial_enemy_count(), 2);
    assert!(sim.grid().positions().all(|p| sim.grid().is_known(p)));
    Ok(())
}

#[test]
fn test_degenerate_rules_fail_fast() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "grid_width": 0 }}"#).unwrap();
    assert!(matches!(
        GameRules::load(file.path()),
        Err(BrambleError::InvalidConfig(_))
    ));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(matches!(GameRules::load(file.path()), Err(BrambleError::Serde(_))));

    assert!(matches!(
        GameRules::load("/definitely/not/here.json"),
        Err(BrambleError::Io(_))
    ));
}
