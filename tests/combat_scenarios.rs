//! Combat and levelling scenarios driven through the public API.

use bramble::{
    resolve_attack, Actor, ActorStats, ActorTemplate, AttackOutcome, BrambleResult, Controls,
    Faction, GameRules, GenerationConfig, Grid, MoveOutcome, Position, Simulation, TileKind,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn template(name: &str, level: u32, health: i32, stamina: i32, damage: i32) -> ActorTemplate {
    ActorTemplate {
        name: name.to_string(),
        level,
        health,
        stamina,
        damage,
        ..ActorTemplate::default()
    }
}

#[test]
fn test_low_level_attacker_earns_level_gap() {
    let rules = GameRules::for_testing();
    let mut rng = StdRng::seed_from_u64(1);
    let mut attacker = Actor::npc(&template("Squire", 1, 50, 50, 12), Faction::Enemy, Position::new(1, 1));
    let mut target = Actor::npc(&template("Ogre", 5, 1, 0, 12), Faction::Neutral, Position::new(2, 1));

    let outcome = resolve_attack(&mut attacker, &mut target, &rules, &mut rng);

    assert_eq!(outcome, AttackOutcome::TargetKilled);
    assert_eq!(attacker.kill_count, 4);
    assert_eq!(target.kill_count, 0);
}

#[test]
fn test_parry_kill_credits_the_defender() {
    let rules = GameRules::for_testing();
    let mut rng = StdRng::seed_from_u64(2);
    // no stamina left, and a max roll of 12 always reaches 2 damage
    let mut attacker = Actor::npc(&template("Squire", 1, 2, 0, 12), Faction::Enemy, Position::new(1, 1));
    let mut target = Actor::npc(&template("Ogre", 5, 30, 30, 12), Faction::Neutral, Position::new(2, 1));

    let outcome = resolve_attack(&mut attacker, &mut target, &rules, &mut rng);

    assert_eq!(outcome, AttackOutcome::AttackerKilled);
    assert!(attacker.stats.is_dead());
    assert_eq!(target.kill_count, 4);
    assert_eq!(attacker.kill_count, 0);
}

#[test]
fn test_drained_attacker_is_parried() {
    let rules = GameRules::for_testing();
    let cost = rules.attack_stamina_cost;

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut attacker = Actor::npc(&template("Tired", 1, 100, 0, 12), Faction::Enemy, Position::new(1, 1));
        let mut target = Actor::npc(&template("Fresh", 1, 100, cost / 2, 12), Faction::Neutral, Position::new(2, 1));

        let outcome = resolve_attack(&mut attacker, &mut target, &rules, &mut rng);

        assert_eq!(outcome, AttackOutcome::TargetAlive);
        // the defender spends half the cost and takes nothing
        assert_eq!(target.stats.health(), 100);
        assert_eq!(target.stats.stamina(), 0);
        // the attacker eats the whole roll
        let taken = 100 - attacker.stats.health();
        assert!((2..=12).contains(&taken), "seed {} took {}", seed, taken);
        assert_eq!(attacker.stats.stamina(), 0);
    }
}

#[test]
fn test_godmode_player_is_untouchable() -> BrambleResult<()> {
    let rules = GameRules {
        player_godmode: true,
        ..GameRules::for_testing()
    };
    let grid = Grid::import_from(
        &["##########", "#........#", "#........#", "##########"],
        false,
        true,
        bramble::TrapDamage::Flat(5),
    )?;
    let mut sim = Simulation::with_grid(grid, rules, 4, Position::new(1, 1))?;
    let brute = ActorTemplate {
        damage: 1000,
        hostile_to: vec![Faction::Player],
        ..ActorTemplate::default()
    };
    let npc = sim.spawn_npc(&brute, Faction::Enemy, Position::new(2, 1))?;
    let before = sim.player().map(|p| p.stats.clone());

    for _ in 0..5 {
        assert_eq!(sim.attack(npc, sim.player_id())?, AttackOutcome::Aborted);
        sim.npc_cycle();
    }

    assert_eq!(sim.player().map(|p| p.stats.clone()), before);
    assert!(!sim.outcome().is_game_over());

    // a godmode swing costs nothing
    let stamina = sim.player().map(|p| p.stats.stamina());
    sim.player_input('d', &Controls::wasd());
    assert_eq!(sim.player().map(|p| p.stats.stamina()), stamina);
    Ok(())
}

#[test]
fn test_player_kill_by_npc_is_recorded() -> BrambleResult<()> {
    let grid = Grid::import_from(&["######", "#....#", "######"], false, true, bramble::TrapDamage::Flat(5))?;
    let rules = GameRules {
        player: ActorTemplate {
            health: 1,
            ..ActorTemplate::player()
        },
        ..GameRules::for_testing()
    };
    let mut sim = Simulation::with_grid(grid, rules, 9, Position::new(1, 1))?;
    let wolf = ActorTemplate {
        name: "Wolf".to_string(),
        damage: 12,
        ..ActorTemplate::default()
    };
    let npc = sim.spawn_npc(&wolf, Faction::Enemy, Position::new(2, 1))?;

    assert_eq!(sim.attack(npc, sim.player_id())?, AttackOutcome::TargetKilled);
    let outcome = sim.outcome();
    assert!(outcome.player_dead());
    assert!(outcome.is_game_over());
    assert_eq!(outcome.killed_by().as_deref(), Some("Wolf"));

    // nothing moves after the game is over
    assert_eq!(sim.player_input('d', &Controls::wasd()), None);
    assert_eq!(sim.move_actor(npc, bramble::Direction::East), MoveOutcome::Blocked);
    Ok(())
}

#[test]
fn test_level_scenario_on_generated_grid() -> BrambleResult<()> {
    let config = GenerationConfig::for_testing(2024);
    let mut rng = bramble::generation::utils::create_rng(&config);
    let grid = Grid::generate(&config, &mut rng)?;

    // outer wall ring
    assert_eq!(grid.size(), (10, 10));
    for pos in grid.positions().filter(|&p| grid.is_edge(p)) {
        assert_eq!(grid.tile_at(pos).map(|t| t.kind), Some(TileKind::Wall));
    }

    let spot = grid.spawnable_positions()[0];
    let mut sim = Simulation::with_grid(grid, GameRules::for_testing(), 2024, spot)?;
    let other = sim
        .grid()
        .spawnable_positions()
        .into_iter()
        .find(|&p| p != spot)
        .expect("a second free tile");
    let npc = sim.spawn_npc(&template("Trainee", 1, 40, 20, 6), Faction::Neutral, other)?;

    let mut stats: ActorStats = sim.actor(npc).map(|a| a.stats.clone()).expect("spawned");
    stats.add_level();
    assert_eq!(stats.level(), 2);
    assert_eq!(stats.max_health(), 40);
    stats.add_level();
    stats.add_level();
    assert_eq!(stats.level(), 4);
    assert_eq!(stats.max_health(), 106);
    Ok(())
}

#[test]
fn test_kills_drive_level_ups_through_the_simulation() -> BrambleResult<()> {
    let grid = Grid::import_from(
        &["##########", "#........#", "#........#", "#........#", "##########"],
        false,
        true,
        bramble::TrapDamage::Flat(5),
    )?;
    let mut sim = Simulation::with_grid(grid, GameRules::for_testing(), 5, Position::new(1, 1))?;
    let fodder = template("Rat", 1, 1, 0, 1);

    // three kills reach the first threshold
    for _ in 0..3 {
        sim.spawn_npc(&fodder, Faction::Neutral, Position::new(2, 1))?;
        let moved = sim.player_input('d', &Controls::wasd());
        assert_eq!(moved, Some(MoveOutcome::Attacked(AttackOutcome::TargetKilled)));
        sim.cleanup();
    }
    sim.apply_level_ups();

    let player = sim.player().expect("player");
    assert_eq!(player.kill_count, 3);
    assert_eq!(player.stats.level(), 2);
    assert_eq!(sim.active_flare().map(|f| f.kind), Some(bramble::FlareKind::LevelUp));
    Ok(())
}
