#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots Gridshot.

mod simulation;

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use gridshot_core::{GameConfig, LevelDefinition};
use gridshot_rendering::{Color, Presentation, RenderingBackend, Scene, Viewport};
use gridshot_rendering_macroquad::{MacroquadBackend, TextureSource};
use gridshot_world::{query, World};

use self::simulation::Simulation;

/// Grid-based raycasting shooter.
#[derive(Debug, Parser)]
#[command(name = "gridshot", about = "Grid-based raycasting shooter")]
struct CliArgs {
    /// TOML file overriding the default tunables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// TOML level definition to play instead of the built-in arena.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,

    /// Texture manifest listing Brick, Wood, Sky and Floor images.
    #[arg(long, value_name = "PATH", conflicts_with = "no_textures")]
    textures: Option<PathBuf>,

    /// Draw every surface with flat colors.
    #[arg(long)]
    no_textures: bool,

    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,

    /// Render as fast as possible instead of waiting for the display refresh.
    #[arg(long)]
    no_vsync: bool,
}

impl CliArgs {
    fn texture_source(&self) -> TextureSource {
        if self.no_textures {
            TextureSource::Disabled
        } else if let Some(manifest) = &self.textures {
            TextureSource::Manifest(manifest.clone())
        } else {
            TextureSource::Procedural
        }
    }
}

/// Entry point for the Gridshot command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_deref())?;
    let level = load_level(args.level.as_deref())?;
    let world = World::from_level(&level, &config).context("level is not playable")?;

    let grid = query::tile_grid(&world);
    log::info!("{}", query::welcome_banner(&world));
    log::info!(
        "arena {}x{} cells of {} units, {} enemies",
        grid.columns(),
        grid.rows(),
        grid.cell_size(),
        query::enemy_view(&world).iter_alive().count()
    );

    let viewport = Viewport::default();
    let mut scene = Scene::new(viewport, config.projection.floor_band_height);
    let mut simulation = Simulation::new(world, config);
    simulation.populate_scene(viewport, &mut scene);

    let backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps)
        .with_texture_source(args.texture_source());
    let presentation = Presentation::new("Gridshot", Color::from_rgb_u8(0, 0, 0), scene);

    backend.run(presentation, move |dt, input, scene| {
        simulation.advance_frame(dt, input, scene)
    })
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: GameConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config at {}", path.display()))?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

fn load_level(path: Option<&Path>) -> Result<LevelDefinition> {
    let Some(path) = path else {
        return Ok(LevelDefinition::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level at {}", path.display()))?;
    let level = toml::from_str(&contents)
        .with_context(|| format!("failed to parse level at {}", path.display()))?;
    log::info!("loaded level from {}", path.display());
    Ok(level)
}
