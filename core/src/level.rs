//! Level description loaded at start-up.

use serde::{Deserialize, Serialize};

/// Static layout of a level: the grid and where everything spawns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Side length of a grid cell in world units.
    pub cell_size: f32,
    /// Row-major tile codes; `0` empty, `1` brick, `2` wood.
    pub grid: Vec<Vec<u8>>,
    /// Player starting pose.
    pub player: PlayerSpawn,
    /// Enemy starting positions.
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
}

impl Default for LevelDefinition {
    /// The ten by ten arena the game ships with.
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            grid: vec![
                vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
                vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
                vec![1, 0, 0, 0, 0, 2, 0, 0, 0, 1],
                vec![1, 0, 0, 1, 0, 0, 0, 1, 0, 1],
                vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
                vec![1, 0, 0, 0, 2, 0, 0, 0, 0, 1],
                vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
                vec![1, 0, 1, 0, 0, 0, 1, 0, 0, 1],
                vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
                vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            ],
            player: PlayerSpawn {
                column: 2.5,
                row: 4.5,
                facing: 0.0,
            },
            enemies: vec![
                EnemySpawn {
                    column: 6.5,
                    row: 2.7,
                },
                EnemySpawn {
                    column: 4.2,
                    row: 6.5,
                },
            ],
        }
    }
}

/// Player starting pose expressed in cell units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    /// Horizontal position in cells; `2.5` is the centre of column 2.
    pub column: f32,
    /// Vertical position in cells.
    pub row: f32,
    /// Initial facing in radians; `0` looks along +x.
    #[serde(default)]
    pub facing: f32,
}

/// Enemy starting position expressed in cell units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Horizontal position in cells.
    pub column: f32,
    /// Vertical position in cells.
    pub row: f32,
}
