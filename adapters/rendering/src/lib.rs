#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gridshot adapters.
//!
//! The projector turns world snapshots into a [`Scene`] of wall slices and
//! billboards, and the frame composer turns a scene into a flat list of
//! [`DrawOp`] values. Both are pure so backends only execute draw operations.

pub mod frame;
pub mod projection;

use anyhow::Result as AnyResult;
use glam::Vec2;
use gridshot_core::{EnemyId, PlayerSnapshot, PlayerStatus, WallKind};
use std::time::Duration;
use thiserror::Error;

pub use frame::compose_frame;
pub use projection::{column_count, project_billboards, project_walls};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with its alpha replaced, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Size of the drawable surface in pixels, re-read by the backend every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Surface width in pixels.
    pub width: f32,
    /// Surface height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Creates a viewport descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Vertical position of the horizon line.
    #[must_use]
    pub fn horizon(&self) -> f32 {
        self.height / 2.0
    }

    /// Whether the surface can hold at least one pixel.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 1.0 && self.height >= 1.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(960.0, 600.0)
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Player controls polled this frame.
    pub controls: gridshot_core::ControlState,
    /// Current size of the drawable surface.
    pub viewport: Viewport,
}

/// Pose the scene is rendered from.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Camera {
    /// World-space eye position.
    pub position: Vec2,
    /// Viewing direction in radians.
    pub facing: f32,
    /// Horizontal field of view in radians.
    pub fov: f32,
}

impl Camera {
    /// Places the camera at the player's eye.
    #[must_use]
    pub fn from_player(player: &PlayerSnapshot) -> Self {
        Self {
            position: player.position,
            facing: player.facing,
            fov: player.fov,
        }
    }
}

/// Texture slots the renderer samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureRole {
    /// Texture for brick walls and the grid boundary.
    Brick,
    /// Texture for wooden walls.
    Wood,
    /// Panoramic sky texture.
    Sky,
    /// Floor texture; its presence enables the floor bands.
    Floor,
}

impl TextureRole {
    /// Every role in load order.
    pub const ALL: [TextureRole; 4] = [
        TextureRole::Brick,
        TextureRole::Wood,
        TextureRole::Sky,
        TextureRole::Floor,
    ];

    /// Texture used for a wall material.
    #[must_use]
    pub const fn for_wall(kind: WallKind) -> Self {
        match kind {
            WallKind::Brick => Self::Brick,
            WallKind::Wood => Self::Wood,
        }
    }
}

/// Pixel dimensions of a loaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureSize {
    /// Creates a texture size descriptor.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Load state of a single texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureState {
    /// Loading has not finished.
    #[default]
    Pending,
    /// The texture is ready to sample.
    Loaded(TextureSize),
    /// Loading failed; the renderer uses flat fills instead.
    Failed,
}

impl TextureState {
    /// Size of the texture when it is usable.
    #[must_use]
    pub const fn loaded(self) -> Option<TextureSize> {
        match self {
            Self::Loaded(size) if size.width > 0 && size.height > 0 => Some(size),
            _ => None,
        }
    }
}

/// Synchronous view of texture availability queried while composing a frame.
pub trait TextureCatalog {
    /// Current state of the texture bound to `role`.
    fn state(&self, role: TextureRole) -> TextureState;
}

/// Fixed table of texture states indexed by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TextureStates {
    states: [TextureState; 4],
}

impl TextureStates {
    /// Table where every role is still pending.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Table where every role failed, forcing flat fills.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            states: [TextureState::Failed; 4],
        }
    }

    /// Records the state of a role.
    pub fn set(&mut self, role: TextureRole, state: TextureState) {
        self.states[Self::index(role)] = state;
    }

    /// Iterator over every role and its state.
    pub fn iter(&self) -> impl Iterator<Item = (TextureRole, TextureState)> + '_ {
        TextureRole::ALL
            .iter()
            .map(|role| (*role, self.states[Self::index(*role)]))
    }

    const fn index(role: TextureRole) -> usize {
        match role {
            TextureRole::Brick => 0,
            TextureRole::Wood => 1,
            TextureRole::Sky => 2,
            TextureRole::Floor => 3,
        }
    }
}

impl TextureCatalog for TextureStates {
    fn state(&self, role: TextureRole) -> TextureState {
        self.states[Self::index(role)]
    }
}

/// Screen-space vertical strip of wall produced by one ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSlice {
    /// Index of the ray that produced the slice.
    pub column: u32,
    /// Left edge in pixels.
    pub x: f32,
    /// Strip width in pixels, slightly wider than a column so strips overlap.
    pub width: f32,
    /// Unclamped top edge in pixels; may lie above the surface.
    pub top: f32,
    /// Unclamped bottom edge in pixels; may lie below the surface.
    pub bottom: f32,
    /// Fisheye-corrected distance to the wall.
    pub distance: f32,
    /// Brightness in `min_shade..=1.0`.
    pub shade: f32,
    /// Material used to pick the texture.
    pub wall: WallKind,
    /// Horizontal texture coordinate in `0.0..1.0`.
    pub texture_u: f32,
}

/// Screen-space placement of an enemy sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Billboard {
    /// Enemy drawn by the billboard.
    pub enemy: EnemyId,
    /// Horizontal centre in pixels.
    pub screen_x: f32,
    /// Projected size in pixels.
    pub size: f32,
    /// Straight-line distance from the camera.
    pub distance: f32,
}

/// Everything the frame composer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Scene {
    /// Surface size the scene was projected for.
    pub viewport: Viewport,
    /// Pose the scene was projected from.
    pub camera: Camera,
    /// Wall strips in column order.
    pub walls: Vec<WallSlice>,
    /// Enemy sprites in enemy order; not depth sorted.
    pub billboards: Vec<Billboard>,
    /// Values shown by the heads-up display.
    pub hud: Option<PlayerStatus>,
    /// Height of each floor shadow band in pixels.
    pub floor_band_height: f32,
}

impl Scene {
    /// Creates an empty scene for the provided surface.
    #[must_use]
    pub fn new(viewport: Viewport, floor_band_height: f32) -> Self {
        Self {
            viewport,
            floor_band_height,
            ..Self::default()
        }
    }
}

/// Axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Primitive drawing operation executed by a backend in list order.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Solid rectangle.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill color, alpha blended.
        color: Color,
    },
    /// Solid circle.
    FillCircle {
        /// Centre in pixels.
        center: Vec2,
        /// Radius in pixels.
        radius: f32,
        /// Fill color, alpha blended.
        color: Color,
    },
    /// Straight line segment.
    Line {
        /// Start point in pixels.
        from: Vec2,
        /// End point in pixels.
        to: Vec2,
        /// Stroke width in pixels.
        thickness: f32,
        /// Stroke color.
        color: Color,
    },
    /// Scaled copy of part of a texture.
    Blit {
        /// Texture to sample.
        role: TextureRole,
        /// Source rectangle in texture pixels.
        source: Rect,
        /// Destination rectangle in screen pixels.
        dest: Rect,
    },
    /// Text with its baseline starting at `position`.
    Text {
        /// Text to draw.
        text: String,
        /// Baseline origin in pixels.
        position: Vec2,
        /// Font size in pixels.
        size: f32,
        /// Text color.
        color: Color,
    },
}

/// Time spent inside the simulation callback for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSimulationBreakdown {
    /// Time spent running systems and applying commands.
    pub simulation: Duration,
    /// Time spent projecting walls and billboards.
    pub scene_population: Duration,
}

impl FrameSimulationBreakdown {
    /// Creates a new breakdown descriptor.
    #[must_use]
    pub const fn new(simulation: Duration, scene_population: Duration) -> Self {
        Self {
            simulation,
            scene_population,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Gridshot scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the measured frame delta
    /// and the input captured by the adapter, advances the simulation and
    /// repopulates the scene before it is composed and drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameSimulationBreakdown + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderingError {
    /// The surface has no drawable area.
    #[error("viewport must be at least one pixel in each direction (received {width}x{height})")]
    InvalidViewport {
        /// Reported width.
        width: f32,
        /// Reported height.
        height: f32,
    },
    /// A procedurally generated texture has a buffer that does not match its size.
    #[error("texture buffer holds {actual} bytes, expected {expected}")]
    TextureBuffer {
        /// Bytes required by the declared size.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}

impl Viewport {
    /// Validates the viewport, returning it unchanged when drawable.
    pub fn validated(self) -> Result<Self, RenderingError> {
        if self.is_drawable() {
            Ok(self)
        } else {
            Err(RenderingError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}
