use std::time::Duration;

use gridshot_core::{
    Command, ControlState, EnemyId, EnemySpawn, Event, FireRejection, GameConfig, LevelDefinition,
    PlayerSpawn,
};
use gridshot_system_combat::Combat;
use gridshot_world::{self as world, query, World};

fn corridor(enemies: &[(f32, f32)]) -> LevelDefinition {
    let mut grid = vec![vec![1; 14]; 5];
    for row in grid.iter_mut().take(4).skip(1) {
        for code in row.iter_mut().take(13).skip(1) {
            *code = 0;
        }
    }
    LevelDefinition {
        cell_size: 64.0,
        grid,
        player: PlayerSpawn {
            column: 1.5,
            row: 2.5,
            facing: 0.0,
        },
        enemies: enemies
            .iter()
            .map(|(column, row)| EnemySpawn {
                column: *column,
                row: *row,
            })
            .collect(),
    }
}

fn pull(world: &mut World, combat: &Combat, controls: ControlState) -> Vec<Event> {
    let mut commands = Vec::new();
    combat.handle(
        &controls,
        &query::player(world),
        &query::enemy_view(world),
        &mut commands,
    );
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn trigger() -> ControlState {
    ControlState {
        fire: true,
        ..ControlState::default()
    }
}

fn reload() -> ControlState {
    ControlState {
        reload: true,
        ..ControlState::default()
    }
}

fn health_of(world: &World, id: u32) -> f32 {
    query::enemy_view(world)
        .iter()
        .find(|enemy| enemy.id == EnemyId::new(id))
        .map(|enemy| enemy.health)
        .expect("enemy exists")
}

#[test]
fn nearest_enemy_on_shared_bearing_takes_the_hit() {
    let config = GameConfig::default();
    let mut world =
        World::from_level(&corridor(&[(8.5, 2.5), (4.5, 2.55)]), &config).expect("level");
    let combat = Combat::new(&config.weapon);

    let events = pull(&mut world, &combat, trigger());

    assert_eq!(health_of(&world, 0), config.enemies.health);
    assert_eq!(
        health_of(&world, 1),
        config.enemies.health - config.weapon.damage
    );
    assert!(events.contains(&Event::ShotFired { ammo_remaining: 19 }));
}

#[test]
fn exact_zero_health_kills_once() {
    let mut config = GameConfig::default();
    config.enemies.health = 36.0;
    let mut world = World::from_level(&corridor(&[(5.5, 2.5)]), &config).expect("level");
    let combat = Combat::new(&config.weapon);

    let mut events = Vec::new();
    for _ in 0..4 {
        events.extend(pull(&mut world, &combat, trigger()));
    }

    let enemy = query::enemy_view(&world).into_vec()[0];
    assert_eq!(enemy.health, 0.0);
    assert!(!enemy.alive);
    assert_eq!(query::status(&world).kills, 1);
    let killed: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyKilled { .. }))
        .collect();
    assert_eq!(
        killed,
        vec![&Event::EnemyKilled {
            enemy: EnemyId::new(0),
            kills: 1
        }]
    );
}

#[test]
fn empty_magazine_makes_fire_a_no_op() {
    let mut config = GameConfig::default();
    config.weapon.capacity = 1;
    config.weapon.damage = 1.0;
    let mut world = World::from_level(&corridor(&[(5.5, 2.5)]), &config).expect("level");
    let combat = Combat::new(&config.weapon);
    let _ = pull(&mut world, &combat, trigger());
    let health = health_of(&world, 0);

    let events = pull(&mut world, &combat, trigger());

    assert_eq!(
        events,
        vec![Event::FireRejected {
            reason: FireRejection::OutOfAmmo
        }]
    );
    assert_eq!(query::weapon(&world).ammo, 0);
    assert_eq!(health_of(&world, 0), health);
}

#[test]
fn reload_blocks_fire_until_duration_elapses() {
    let config = GameConfig::default();
    let mut world = World::from_level(&corridor(&[(5.5, 2.5)]), &config).expect("level");
    let combat = Combat::new(&config.weapon);
    let _ = pull(&mut world, &combat, trigger());
    let ammo = query::weapon(&world).ammo;

    let started = pull(&mut world, &combat, reload());
    assert!(matches!(started.as_slice(), [Event::ReloadStarted { .. }]));

    let blocked = pull(&mut world, &combat, trigger());
    assert_eq!(
        blocked,
        vec![Event::FireRejected {
            reason: FireRejection::Reloading
        }]
    );
    assert_eq!(query::weapon(&world).ammo, ammo);

    let mut events = Vec::new();
    let frame = Duration::from_millis(50);
    let mut elapsed = Duration::ZERO;
    while elapsed < config.weapon.reload_duration() {
        world::apply(&mut world, Command::Tick { dt: frame }, &mut events);
        elapsed += frame;
    }

    let weapon = query::weapon(&world);
    assert_eq!(weapon.ammo, config.weapon.capacity);
    assert!(weapon.can_fire());
    let fired = pull(&mut world, &combat, trigger());
    assert!(fired.contains(&Event::ShotFired {
        ammo_remaining: config.weapon.capacity - 1
    }));
}
