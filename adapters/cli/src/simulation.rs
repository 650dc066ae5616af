//! Per-frame driver that runs the systems against the world and fills the scene.

use std::time::{Duration, Instant};

use gridshot_core::{Command, ControlState, Event, FireRejection, GameConfig};
use gridshot_rendering::{
    project_billboards, project_walls, Camera, FrameInput, FrameSimulationBreakdown, Scene,
    Viewport,
};
use gridshot_system_combat::Combat;
use gridshot_system_locomotion::Locomotion;
use gridshot_system_pursuit::Pursuit;
use gridshot_system_raycast::cast_ray;
use gridshot_world::{self as world, query, World};

/// Owns the world, the systems and the reusable command and event buffers.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    config: GameConfig,
    locomotion: Locomotion,
    combat: Combat,
    pursuit: Pursuit,
    commands: Vec<Command>,
    events: Vec<Event>,
    player_dead: bool,
}

impl Simulation {
    pub(crate) fn new(world: World, config: GameConfig) -> Self {
        Self {
            locomotion: Locomotion::new(&config.player),
            combat: Combat::new(&config.weapon),
            pursuit: Pursuit::new(&config.enemies),
            world,
            config,
            commands: Vec::new(),
            events: Vec::new(),
            player_dead: false,
        }
    }

    /// Advances the world by one frame and repopulates `scene` for `input.viewport`.
    pub(crate) fn advance_frame(
        &mut self,
        dt: Duration,
        input: FrameInput,
        scene: &mut Scene,
    ) -> FrameSimulationBreakdown {
        let simulation_start = Instant::now();
        self.step(dt, &input.controls);
        let simulation = simulation_start.elapsed();

        let population_start = Instant::now();
        self.populate_scene(input.viewport, scene);
        FrameSimulationBreakdown::new(simulation, population_start.elapsed())
    }

    /// Runs look, the clock tick, combat, locomotion and pursuit in that order.
    ///
    /// Each system reads the world as left by the previous one.
    fn step(&mut self, dt: Duration, controls: &ControlState) {
        let dt = dt.min(self.config.simulation.max_frame_delta());
        self.events.clear();

        self.locomotion.look(controls, &mut self.commands);
        self.flush_commands();

        self.commands.push(Command::Tick { dt });
        self.flush_commands();

        let player = query::player(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.combat
            .handle(controls, &player, &enemies, &mut self.commands);
        self.flush_commands();

        let player = query::player(&self.world);
        self.locomotion
            .handle(controls, &player, dt, &mut self.commands);
        self.flush_commands();

        let player = query::player(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.pursuit
            .handle(&player, &enemies, dt, &mut self.commands);
        self.flush_commands();

        self.report_events();
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn report_events(&mut self) {
        for event in &self.events {
            match event {
                Event::ShotFired { ammo_remaining } => {
                    log::debug!("shot fired, {ammo_remaining} rounds left");
                }
                Event::FireRejected { reason } => match reason {
                    FireRejection::OutOfAmmo => log::debug!("click: magazine empty"),
                    FireRejection::Reloading => log::debug!("cannot fire while reloading"),
                },
                Event::ReloadIgnored => log::debug!("reload already in progress"),
                Event::EnemyKilled { enemy, kills } => {
                    log::info!("enemy {} down ({kills} kills)", enemy.get());
                }
                Event::ReloadCompleted { ammo } => log::info!("reloaded, {ammo} rounds"),
                Event::PlayerDamaged { health, .. } if *health <= 0.0 && !self.player_dead => {
                    self.player_dead = true;
                    log::info!("player died after {} ticks", query::tick_index(&self.world));
                }
                _ => {}
            }
        }
    }

    /// Rebuilds the camera, wall slices, billboards and HUD from the current world.
    pub(crate) fn populate_scene(&self, viewport: Viewport, scene: &mut Scene) {
        let projection = &self.config.projection;
        let raycast = &self.config.raycast;
        let player = query::player(&self.world);
        let map = query::tile_map(&self.world);
        let cell_size = map.cell_size();

        scene.viewport = viewport;
        scene.camera = Camera::from_player(&player);
        scene.floor_band_height = projection.floor_band_height;
        scene.hud = Some(query::status(&self.world));

        project_walls(
            &scene.camera,
            viewport,
            cell_size,
            projection,
            |angle| cast_ray(&map, player.position, angle, raycast),
            &mut scene.walls,
        );
        project_billboards(
            &scene.camera,
            viewport,
            cell_size,
            projection,
            &query::enemy_view(&self.world),
            &mut scene.billboards,
        );
    }
}
