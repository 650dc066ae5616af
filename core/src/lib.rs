#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridshot engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters poll a [`ControlState`]
//! once per frame, systems translate it (together with immutable world views)
//! into [`Command`] values, the world executes those commands via its `apply`
//! entry point, and then broadcasts [`Event`] values describing what changed.

pub mod config;
pub mod level;

use std::{f32::consts::PI, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use config::{
    ConfigError, EnemyConfig, GameConfig, PlayerConfig, ProjectionConfig, RaycastConfig,
    SimulationConfig, WeaponConfig,
};
pub use level::{EnemySpawn, LevelDefinition, PlayerSpawn};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Gridshot.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Rotates the player's facing by the provided angle.
    TurnPlayer {
        /// Signed rotation in radians; positive turns clockwise on screen.
        radians: f32,
    },
    /// Requests that the player move by the provided world-space displacement.
    ///
    /// The world resolves collisions one axis at a time, so a blocked axis
    /// does not prevent progress along the other.
    MovePlayer {
        /// Desired displacement in world units.
        displacement: Vec2,
    },
    /// Requests that an enemy move by the provided world-space displacement.
    MoveEnemy {
        /// Identifier of the enemy attempting to move.
        enemy: EnemyId,
        /// Desired displacement in world units.
        displacement: Vec2,
    },
    /// Applies melee damage to the player.
    DamagePlayer {
        /// Health points to subtract.
        amount: f32,
    },
    /// Pulls the trigger, consuming one round when the weapon is ready.
    FireWeapon {
        /// Enemy selected by the hit-scan, if any qualified.
        target: Option<EnemyId>,
    },
    /// Starts reloading the weapon.
    Reload,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports the player's facing after a turn.
    PlayerTurned {
        /// Facing angle in radians, wrapped to `[0, 2π)`.
        facing: f32,
    },
    /// Confirms that the player position changed.
    PlayerMoved {
        /// Position before the move.
        from: Vec2,
        /// Position after collision resolution.
        to: Vec2,
    },
    /// Confirms that an enemy moved.
    EnemyMoved {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Position before the move.
        from: Vec2,
        /// Position after the move.
        to: Vec2,
    },
    /// Reports melee damage applied to the player.
    PlayerDamaged {
        /// Damage that was requested.
        amount: f32,
        /// Remaining health after clamping at zero.
        health: f32,
    },
    /// Confirms that a round was fired.
    ShotFired {
        /// Rounds left in the weapon after the shot.
        ammo_remaining: u32,
    },
    /// Reports that a fire request was ignored.
    FireRejected {
        /// Reason the weapon could not fire.
        reason: FireRejection,
    },
    /// Reports that a shot connected with an enemy.
    EnemyHit {
        /// Identifier of the enemy that was hit.
        enemy: EnemyId,
        /// Remaining health of the enemy.
        health: f32,
    },
    /// Reports that an enemy died.
    EnemyKilled {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Total kills after this one.
        kills: u32,
    },
    /// Confirms that a reload began.
    ReloadStarted {
        /// Time until the magazine is refilled.
        duration: Duration,
    },
    /// Reports that a reload request arrived while already reloading.
    ReloadIgnored,
    /// Confirms that a reload finished.
    ReloadCompleted {
        /// Rounds available after the reload.
        ammo: u32,
    },
}

/// Reasons a fire request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireRejection {
    /// The magazine is empty.
    OutOfAmmo,
    /// A reload is in progress.
    Reloading,
}

/// Material of a solid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    /// Brick wall, tile code `1`.
    Brick,
    /// Wooden wall, tile code `2`.
    Wood,
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Walkable, transparent cell.
    #[default]
    Empty,
    /// Solid cell that blocks movement and rays.
    Wall(WallKind),
}

impl Tile {
    /// Decodes a level tile code.
    ///
    /// `0` is empty, `1` brick and `2` wood; any other code is rejected.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Wall(WallKind::Brick)),
            2 => Some(Self::Wall(WallKind::Wood)),
            _ => None,
        }
    }

    /// Encodes the tile into its level code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Wall(WallKind::Brick) => 1,
            Self::Wall(WallKind::Wood) => 2,
        }
    }
}

/// Result of looking up the tile under a world-space point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileLookup {
    /// The point lies outside the grid. Treated as solid.
    OutOfBounds,
    /// The point lies in an empty cell.
    Empty,
    /// The point lies in a wall cell of the given kind.
    Wall(WallKind),
}

impl TileLookup {
    /// Reports whether the lookup blocks movement and terminates rays.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Read-only view into the tile grid.
#[derive(Clone, Copy, Debug)]
pub struct TileMapView<'a> {
    tiles: &'a [Tile],
    columns: u32,
    rows: u32,
    cell_size: f32,
}

impl<'a> TileMapView<'a> {
    /// Captures a new view backed by a row-major tile slice.
    #[must_use]
    pub fn new(tiles: &'a [Tile], columns: u32, rows: u32, cell_size: f32) -> Self {
        Self {
            tiles,
            columns,
            rows,
            cell_size,
        }
    }

    /// Looks up the tile stored at the provided column and row.
    #[must_use]
    pub fn tile(&self, column: i64, row: i64) -> TileLookup {
        if column < 0 || row < 0 || column >= i64::from(self.columns) || row >= i64::from(self.rows)
        {
            return TileLookup::OutOfBounds;
        }
        let Ok(index) = usize::try_from(row * i64::from(self.columns) + column) else {
            return TileLookup::OutOfBounds;
        };
        match self.tiles.get(index) {
            Some(Tile::Empty) => TileLookup::Empty,
            Some(Tile::Wall(kind)) => TileLookup::Wall(*kind),
            None => TileLookup::OutOfBounds,
        }
    }

    /// Looks up the tile containing the provided world-space point.
    #[must_use]
    pub fn tile_at(&self, point: Vec2) -> TileLookup {
        match self.cell_of(point) {
            Some((column, row)) => self.tile(column, row),
            None => TileLookup::OutOfBounds,
        }
    }

    /// Reports whether a body centred on `point` may occupy it.
    #[must_use]
    pub fn is_walkable(&self, point: Vec2) -> bool {
        self.tile_at(point) == TileLookup::Empty
    }

    /// Converts a world-space point into signed cell indices.
    ///
    /// Returns `None` for non-finite points or a degenerate cell size.
    #[must_use]
    pub fn cell_of(&self, point: Vec2) -> Option<(i64, i64)> {
        if !point.is_finite() || self.cell_size <= 0.0 {
            return None;
        }
        let column = (point.x / self.cell_size).floor() as i64;
        let row = (point.y / self.cell_size).floor() as i64;
        Some((column, row))
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of columns and rows in the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Extent of the grid in world units.
    #[must_use]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// World-space position.
    pub position: Vec2,
    /// Facing angle in radians, wrapped to `[0, 2π)`.
    pub facing: f32,
    /// Horizontal field of view in radians.
    pub fov: f32,
    /// Half extent of the collision box.
    pub radius: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Remaining health.
    pub health: f32,
}

impl PlayerSnapshot {
    /// Unit vector pointing along the player's facing.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.facing)
    }
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// World-space position.
    pub position: Vec2,
    /// Remaining health.
    pub health: f32,
    /// Whether the enemy still participates in AI and rendering.
    pub alive: bool,
    /// Collision and visual radius.
    pub size: f32,
}

/// Read-only snapshot describing all enemies, dead ones included.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every captured snapshot in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over enemies that are still alive, in identifier order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.alive)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the weapon state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeaponSnapshot {
    /// Rounds currently loaded.
    pub ammo: u32,
    /// Rounds held by a full magazine.
    pub capacity: u32,
    /// Time left on the active reload, if one is running.
    pub reload_remaining: Option<Duration>,
}

impl WeaponSnapshot {
    /// Reports whether a fire request would currently be honoured.
    #[must_use]
    pub const fn can_fire(&self) -> bool {
        self.ammo > 0 && self.reload_remaining.is_none()
    }

    /// Reports whether a reload is in progress.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }
}

/// Values exposed to a host UI after every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerStatus {
    /// Player health in `0..=100`.
    pub health: f32,
    /// Rounds currently loaded.
    pub ammo: u32,
    /// Rounds held by a full magazine.
    pub capacity: u32,
    /// Number of enemies killed.
    pub kills: u32,
    /// Whether a reload is in progress.
    pub reloading: bool,
}

/// Player intent polled from the input collaborator once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlState {
    /// Move along the facing direction.
    pub forward: bool,
    /// Move against the facing direction.
    pub backward: bool,
    /// Strafe perpendicular to the facing, to the left.
    pub strafe_left: bool,
    /// Strafe perpendicular to the facing, to the right.
    pub strafe_right: bool,
    /// Edge-triggered fire request.
    pub fire: bool,
    /// Edge-triggered reload request.
    pub reload: bool,
    /// Horizontal pointer motion in pixels accumulated since the last frame.
    pub look_delta: f32,
}

/// Surface struck by a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitSurface {
    /// A wall cell inside the grid.
    Wall(WallKind),
    /// The implicit wall surrounding the grid.
    Boundary,
}

impl HitSurface {
    /// Wall material used to texture the surface.
    ///
    /// The boundary is drawn with brick.
    #[must_use]
    pub const fn wall_kind(self) -> WallKind {
        match self {
            Self::Wall(kind) => kind,
            Self::Boundary => WallKind::Brick,
        }
    }
}

/// First solid surface found by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Distance travelled along the ray, a multiple of the march step.
    pub distance: f32,
    /// World-space sample point that landed in the solid cell.
    pub point: Vec2,
    /// Surface that stopped the ray.
    pub surface: HitSurface,
}

/// Wraps an angle into the half-open interval `(−π, π]`.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    let tau = 2.0 * PI;
    PI - (PI - angle).rem_euclid(tau)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn bordered_grid(size: u32) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for row in 0..size {
            for column in 0..size {
                let border = row == 0 || column == 0 || row == size - 1 || column == size - 1;
                tiles.push(if border {
                    Tile::Wall(WallKind::Brick)
                } else {
                    Tile::Empty
                });
            }
        }
        tiles
    }

    #[test]
    fn tile_at_reports_out_of_bounds_outside_grid() {
        let tiles = bordered_grid(4);
        let view = TileMapView::new(&tiles, 4, 4, 10.0);

        for point in [
            Vec2::new(-0.01, 5.0),
            Vec2::new(5.0, -0.01),
            Vec2::new(40.0, 5.0),
            Vec2::new(5.0, 40.0),
            Vec2::new(-35.0, -35.0),
            Vec2::new(f32::NAN, 5.0),
        ] {
            assert_eq!(view.tile_at(point), TileLookup::OutOfBounds, "{point:?}");
        }
    }

    #[test]
    fn tile_at_matches_stored_grid_inside_bounds() {
        let mut tiles = bordered_grid(4);
        tiles[5] = Tile::Wall(WallKind::Wood);
        let view = TileMapView::new(&tiles, 4, 4, 10.0);

        for row in 0..4_i64 {
            for column in 0..4_i64 {
                let point = Vec2::new(column as f32 * 10.0 + 3.0, row as f32 * 10.0 + 7.0);
                let expected = match tiles[(row * 4 + column) as usize] {
                    Tile::Empty => TileLookup::Empty,
                    Tile::Wall(kind) => TileLookup::Wall(kind),
                };
                assert_eq!(view.tile_at(point), expected);
            }
        }
        assert_eq!(
            view.tile_at(Vec2::new(15.0, 15.0)),
            TileLookup::Wall(WallKind::Wood)
        );
    }

    #[test]
    fn walkability_requires_empty_in_bounds_cell() {
        let tiles = bordered_grid(3);
        let view = TileMapView::new(&tiles, 3, 3, 8.0);

        assert!(view.is_walkable(Vec2::new(12.0, 12.0)));
        assert!(!view.is_walkable(Vec2::new(4.0, 12.0)));
        assert!(!view.is_walkable(Vec2::new(-1.0, 12.0)));
    }

    #[test]
    fn tile_codes_round_trip_and_reject_unknown_values() {
        for code in 0..=2 {
            let tile = Tile::from_code(code).expect("known code");
            assert_eq!(tile.code(), code);
        }
        assert!(Tile::from_code(3).is_none());
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_interval() {
        let cases = [
            (0.0, 0.0),
            (PI, PI),
            (-PI, PI),
            (3.0 * PI / 2.0, -PI / 2.0),
            (-3.0 * PI / 2.0, PI / 2.0),
            (5.0 * PI, PI),
        ];
        for (input, expected) in cases {
            let actual = normalize_angle(input);
            assert!(
                (actual - expected).abs() < 1e-4,
                "normalize_angle({input}) = {actual}, expected {expected}"
            );
            assert!(actual > -PI && actual <= PI + 1e-6);
        }
    }

    #[test]
    fn weapon_readiness_requires_ammo_and_no_reload() {
        let ready = WeaponSnapshot {
            ammo: 3,
            capacity: 20,
            reload_remaining: None,
        };
        assert!(ready.can_fire());

        let empty = WeaponSnapshot { ammo: 0, ..ready };
        assert!(!empty.can_fire());

        let reloading = WeaponSnapshot {
            reload_remaining: Some(Duration::from_millis(300)),
            ..ready
        };
        assert!(!reloading.can_fire());
        assert!(reloading.is_reloading());
    }

    #[test]
    fn enemy_view_orders_by_identifier_and_filters_dead() {
        let snapshot = |id: u32, alive: bool| EnemySnapshot {
            id: EnemyId::new(id),
            position: Vec2::ZERO,
            health: 30.0,
            alive,
            size: 16.0,
        };
        let view = EnemyView::from_snapshots(vec![
            snapshot(2, true),
            snapshot(0, false),
            snapshot(1, true),
        ]);

        let all: Vec<u32> = view.iter().map(|enemy| enemy.id.get()).collect();
        let alive: Vec<u32> = view.iter_alive().map(|enemy| enemy.id.get()).collect();
        assert_eq!(all, vec![0, 1, 2]);
        assert_eq!(alive, vec![1, 2]);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn wire_types_round_trip_through_bincode() {
        assert_round_trip(&EnemyId::new(7));
        assert_round_trip(&Tile::Wall(WallKind::Wood));
        assert_round_trip(&FireRejection::Reloading);
        assert_round_trip(&GameConfig::default());
    }
}
