#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridshot.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use gridshot_core::{
    Command, EnemyId, Event, FireRejection, GameConfig, LevelDefinition, Tile, WELCOME_BANNER,
};
use thiserror::Error;

/// Describes the static tile layout of the world.
#[derive(Debug)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    fn from_codes(codes: &[Vec<u8>], cell_size: f32) -> Result<Self, LevelError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(LevelError::InvalidCellSize { cell_size });
        }
        let rows = codes.len();
        let columns = codes.first().map_or(0, Vec::len);
        if rows == 0 || columns == 0 {
            return Err(LevelError::EmptyGrid);
        }

        let mut tiles = Vec::with_capacity(rows * columns);
        for (row, line) in codes.iter().enumerate() {
            if line.len() != columns {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: columns,
                    found: line.len(),
                });
            }
            for (column, code) in line.iter().enumerate() {
                let tile = Tile::from_code(*code).ok_or(LevelError::UnknownTile {
                    column,
                    row,
                    code: *code,
                })?;
                tiles.push(tile);
            }
        }

        let columns = u32::try_from(columns).map_err(|_| LevelError::TooLarge)?;
        let rows = u32::try_from(rows).map_err(|_| LevelError::TooLarge)?;
        Ok(Self {
            columns,
            rows,
            cell_size,
            tiles,
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn view(&self) -> gridshot_core::TileMapView<'_> {
        gridshot_core::TileMapView::new(&self.tiles, self.columns, self.rows, self.cell_size)
    }
}

/// Represents the authoritative Gridshot world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tile_grid: TileGrid,
    player: Player,
    enemies: Vec<Enemy>,
    weapon: Weapon,
    kills: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world from the built-in level and default tunables.
    #[must_use]
    pub fn new() -> Self {
        Self::from_level(&LevelDefinition::default(), &GameConfig::default())
            .expect("built-in level is always valid")
    }

    /// Creates a world from a level definition.
    ///
    /// Fails when the grid is malformed or a spawn point is not walkable.
    pub fn from_level(level: &LevelDefinition, config: &GameConfig) -> Result<Self, LevelError> {
        let tile_grid = TileGrid::from_codes(&level.grid, level.cell_size)?;
        let view = tile_grid.view();
        let cell_size = tile_grid.cell_size();

        let player_position = Vec2::new(level.player.column, level.player.row) * cell_size;
        if !view.is_walkable(player_position) {
            return Err(LevelError::BlockedSpawn {
                site: SpawnSite::Player,
                column: level.player.column,
                row: level.player.row,
            });
        }

        let mut enemies = Vec::with_capacity(level.enemies.len());
        for (index, spawn) in level.enemies.iter().enumerate() {
            let position = Vec2::new(spawn.column, spawn.row) * cell_size;
            if !view.is_walkable(position) {
                return Err(LevelError::BlockedSpawn {
                    site: SpawnSite::Enemy(index),
                    column: spawn.column,
                    row: spawn.row,
                });
            }
            let id = u32::try_from(index).map_err(|_| LevelError::TooLarge)?;
            enemies.push(Enemy {
                id: EnemyId::new(id),
                position,
                health: config.enemies.health,
                alive: true,
                size: config.enemies.size,
            });
        }

        let player = Player {
            position: player_position,
            facing: level.player.facing.rem_euclid(TAU),
            fov: config.player.fov,
            radius: config.player.radius,
            speed: config.player.speed,
            health: config.player.max_health,
            max_health: config.player.max_health,
        };

        let weapon = Weapon {
            ammo: config.weapon.capacity,
            capacity: config.weapon.capacity,
            damage: config.weapon.damage,
            reload_duration: config.weapon.reload_duration(),
            reload_remaining: None,
        };

        Ok(Self {
            banner: WELCOME_BANNER,
            tile_grid,
            player,
            enemies,
            weapon,
            kills: 0,
            tick_index: 0,
        })
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|candidate| candidate.id == enemy)
    }

    fn move_player(&mut self, displacement: Vec2, out_events: &mut Vec<Event>) {
        if !displacement.is_finite() {
            return;
        }

        let view = self.tile_grid.view();
        let radius = self.player.radius;
        let from = self.player.position;
        let mut position = from;

        let next_x = position.x + displacement.x;
        if view.is_walkable(Vec2::new(next_x - radius, position.y - radius))
            && view.is_walkable(Vec2::new(next_x + radius, position.y + radius))
        {
            position.x = next_x;
        }

        let next_y = position.y + displacement.y;
        if view.is_walkable(Vec2::new(position.x - radius, next_y - radius))
            && view.is_walkable(Vec2::new(position.x + radius, next_y + radius))
        {
            position.y = next_y;
        }

        if position != from {
            self.player.position = position;
            out_events.push(Event::PlayerMoved { from, to: position });
        }
    }

    fn move_enemy(&mut self, enemy: EnemyId, displacement: Vec2, out_events: &mut Vec<Event>) {
        if !displacement.is_finite() {
            return;
        }
        let Some(index) = self.enemies.iter().position(|candidate| candidate.id == enemy) else {
            return;
        };
        if !self.enemies[index].alive {
            return;
        }

        let from = self.enemies[index].position;
        let to = from + displacement;
        if to == from || !self.tile_grid.view().is_walkable(to) {
            return;
        }

        self.enemies[index].position = to;
        out_events.push(Event::EnemyMoved { enemy, from, to });
    }

    fn fire(&mut self, target: Option<EnemyId>, out_events: &mut Vec<Event>) {
        if self.weapon.reload_remaining.is_some() {
            out_events.push(Event::FireRejected {
                reason: FireRejection::Reloading,
            });
            return;
        }
        if self.weapon.ammo == 0 {
            out_events.push(Event::FireRejected {
                reason: FireRejection::OutOfAmmo,
            });
            return;
        }

        self.weapon.ammo -= 1;
        out_events.push(Event::ShotFired {
            ammo_remaining: self.weapon.ammo,
        });

        let Some(target) = target else {
            return;
        };
        let damage = self.weapon.damage;
        let Some(enemy) = self.enemy_mut(target) else {
            return;
        };
        if !enemy.alive {
            return;
        }

        enemy.health -= damage;
        let health = enemy.health;
        let killed = health <= 0.0;
        if killed {
            enemy.alive = false;
        }
        out_events.push(Event::EnemyHit {
            enemy: target,
            health,
        });

        if killed {
            self.kills = self.kills.saturating_add(1);
            out_events.push(Event::EnemyKilled {
                enemy: target,
                kills: self.kills,
            });
        }
    }

    fn advance_reload(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(remaining) = self.weapon.reload_remaining else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.weapon.reload_remaining = None;
            self.weapon.ammo = self.weapon.capacity;
            out_events.push(Event::ReloadCompleted {
                ammo: self.weapon.ammo,
            });
        } else {
            self.weapon.reload_remaining = Some(remaining);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_reload(dt, out_events);
        }
        Command::TurnPlayer { radians } => {
            if radians == 0.0 || !radians.is_finite() {
                return;
            }
            world.player.facing = (world.player.facing + radians).rem_euclid(TAU);
            out_events.push(Event::PlayerTurned {
                facing: world.player.facing,
            });
        }
        Command::MovePlayer { displacement } => world.move_player(displacement, out_events),
        Command::MoveEnemy {
            enemy,
            displacement,
        } => world.move_enemy(enemy, displacement, out_events),
        Command::DamagePlayer { amount } => {
            if !(amount.is_finite() && amount > 0.0) {
                return;
            }
            world.player.health = (world.player.health - amount).clamp(0.0, world.player.max_health);
            out_events.push(Event::PlayerDamaged {
                amount,
                health: world.player.health,
            });
        }
        Command::FireWeapon { target } => world.fire(target, out_events),
        Command::Reload => {
            if world.weapon.reload_remaining.is_some() {
                out_events.push(Event::ReloadIgnored);
                return;
            }
            world.weapon.reload_remaining = Some(world.weapon.reload_duration);
            out_events.push(Event::ReloadStarted {
                duration: world.weapon.reload_duration,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{TileGrid, World};
    use gridshot_core::{
        EnemySnapshot, EnemyView, PlayerSnapshot, PlayerStatus, TileMapView, WeaponSnapshot,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's tile grid definition.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.tile_grid
    }

    /// Exposes a read-only view of the tile grid for collision and ray queries.
    #[must_use]
    pub fn tile_map(world: &World) -> TileMapView<'_> {
        world.tile_grid.view()
    }

    /// Captures the player's current pose and health.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        let player = &world.player;
        PlayerSnapshot {
            position: player.position,
            facing: player.facing,
            fov: player.fov,
            radius: player.radius,
            speed: player.speed,
            health: player.health,
        }
    }

    /// Captures a read-only view of every enemy, including dead ones.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    position: enemy.position,
                    health: enemy.health,
                    alive: enemy.alive,
                    size: enemy.size,
                })
                .collect(),
        )
    }

    /// Captures the weapon's magazine and reload state.
    #[must_use]
    pub fn weapon(world: &World) -> WeaponSnapshot {
        WeaponSnapshot {
            ammo: world.weapon.ammo,
            capacity: world.weapon.capacity,
            reload_remaining: world.weapon.reload_remaining,
        }
    }

    /// Values a host UI displays after every tick.
    #[must_use]
    pub fn status(world: &World) -> PlayerStatus {
        PlayerStatus {
            health: world.player.health,
            ammo: world.weapon.ammo,
            capacity: world.weapon.capacity,
            kills: world.kills,
            reloading: world.weapon.reload_remaining.is_some(),
        }
    }

    /// Number of simulation ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Debug)]
struct Player {
    position: Vec2,
    facing: f32,
    fov: f32,
    radius: f32,
    speed: f32,
    health: f32,
    max_health: f32,
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    position: Vec2,
    health: f32,
    alive: bool,
    size: f32,
}

#[derive(Clone, Debug)]
struct Weapon {
    ammo: u32,
    capacity: u32,
    damage: f32,
    reload_duration: Duration,
    reload_remaining: Option<Duration>,
}

/// Identifies which spawn point failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnSite {
    /// The player's spawn.
    Player,
    /// The enemy spawn at the given index in the level definition.
    Enemy(usize),
}

/// Reasons a level definition may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The grid has no rows or no columns.
    #[error("level grid is empty")]
    EmptyGrid,
    /// A row length differs from the first row.
    #[error("level row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A tile code is not recognised.
    #[error("unknown tile code {code} at column {column}, row {row}")]
    UnknownTile {
        /// Zero-based column index.
        column: usize,
        /// Zero-based row index.
        row: usize,
        /// Offending code.
        code: u8,
    },
    /// The cell size is zero, negative or not finite.
    #[error("cell size must be positive (received {cell_size})")]
    InvalidCellSize {
        /// Offending cell size.
        cell_size: f32,
    },
    /// A spawn point lies in a solid or out-of-bounds cell.
    #[error("{site:?} spawn at ({column}, {row}) is not walkable")]
    BlockedSpawn {
        /// Which spawn failed.
        site: SpawnSite,
        /// Spawn column in cell units.
        column: f32,
        /// Spawn row in cell units.
        row: f32,
    },
    /// The grid or enemy list exceeds the supported size.
    #[error("level is too large")]
    TooLarge,
}
