#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Gridshot.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter owns the window, samples keyboard and pointer input, uploads
//! textures and executes the draw list composed by `gridshot-rendering`.
//! Everything it draws comes from that list, so no game logic lives here.

mod textures;

pub use self::textures::{parse_manifest, procedural, PixelBuffer, TextureBank, TextureSource};

use anyhow::{Context, Result};
use glam::Vec2;
use gridshot_core::ControlState;
use gridshot_rendering::{
    compose_frame, DrawOp, FrameInput, FrameSimulationBreakdown, Presentation, RenderingBackend,
    Scene, Viewport,
};
use macroquad::{
    color::WHITE,
    input::{
        is_key_down, is_key_pressed, is_mouse_button_pressed, mouse_position, set_cursor_grab,
        show_mouse, KeyCode, MouseButton,
    },
    math::{vec2, Rect as MacroquadRect},
    shapes::{draw_circle, draw_line, draw_rectangle},
    text::draw_text,
    texture::{draw_texture_ex, DrawTextureParams},
};
use std::{
    collections::VecDeque,
    sync::mpsc,
    time::{Duration, Instant},
};

const WINDOW_WIDTH: i32 = 960;
const WINDOW_HEIGHT: i32 = 600;

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    texture_source: TextureSource,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Selects where textures come from.
    #[must_use]
    pub fn with_texture_source(mut self, source: TextureSource) -> Self {
        self.texture_source = source;
        self
    }
}

/// Durations measured for a single rendered frame.
#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    scene_population: Duration,
    render: Duration,
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    scene_population_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_scene_population: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);

        self.simulation_accum += breakdown.simulation;
        self.scene_population_accum += breakdown.scene_population;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        let accumulated = [
            self.simulation_accum,
            self.scene_population_accum,
            self.render_accum,
        ];
        self.reset_second();
        if seconds <= f32::EPSILON || frames == 0 {
            return None;
        }

        let per_second = frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let [avg_simulation, avg_scene_population, avg_render] =
            accumulated.map(|total| total / frames);

        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation,
            avg_scene_population,
            avg_render,
        })
    }

    fn reset_second(&mut self) {
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.scene_population_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
    }
}

/// Raw device state sampled once per frame.
#[derive(Clone, Copy, Debug, Default)]
struct InputObservations {
    forward: bool,
    backward: bool,
    strafe_left: bool,
    strafe_right: bool,
    reload_pressed: bool,
    primary_click: bool,
    release_pressed: bool,
    quit_pressed: bool,
    cursor: Vec2,
}

impl InputObservations {
    fn poll() -> Self {
        let held = |keys: [KeyCode; 2]| keys.into_iter().any(is_key_down);
        let (cursor_x, cursor_y) = mouse_position();

        Self {
            forward: held([KeyCode::W, KeyCode::Up]),
            backward: held([KeyCode::S, KeyCode::Down]),
            strafe_left: held([KeyCode::A, KeyCode::Left]),
            strafe_right: held([KeyCode::D, KeyCode::Right]),
            reload_pressed: is_key_pressed(KeyCode::R),
            primary_click: is_mouse_button_pressed(MouseButton::Left),
            release_pressed: is_key_pressed(KeyCode::Escape),
            quit_pressed: is_key_pressed(KeyCode::Q),
            cursor: Vec2::new(cursor_x, cursor_y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaptureChange {
    Unchanged,
    Captured,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameControls {
    controls: ControlState,
    capture: CaptureChange,
    quit: bool,
}

/// Pointer-lock state machine.
///
/// The first click captures the pointer without firing, clicks while
/// captured fire, and Escape releases. Look motion is only reported while
/// captured and never on the frame the capture starts.
#[derive(Clone, Copy, Debug, Default)]
struct PointerCapture {
    captured: bool,
    last_cursor: Option<Vec2>,
}

impl PointerCapture {
    fn observe(&mut self, observations: InputObservations) -> FrameControls {
        let mut capture = CaptureChange::Unchanged;
        let mut fire = false;

        if self.captured && observations.release_pressed {
            self.captured = false;
            capture = CaptureChange::Released;
        } else if observations.primary_click {
            if self.captured {
                fire = true;
            } else {
                self.captured = true;
                capture = CaptureChange::Captured;
            }
        }

        let look_delta = match self.last_cursor {
            Some(last) if self.captured && capture == CaptureChange::Unchanged => {
                observations.cursor.x - last.x
            }
            _ => 0.0,
        };
        self.last_cursor = Some(observations.cursor);

        FrameControls {
            controls: ControlState {
                forward: observations.forward,
                backward: observations.backward,
                strafe_left: observations.strafe_left,
                strafe_right: observations.strafe_right,
                fire,
                reload: observations.reload_pressed,
                look_delta,
            },
            capture,
            quit: observations.quit_pressed,
        }
    }
}

fn apply_capture_change(change: CaptureChange) {
    match change {
        CaptureChange::Unchanged => {}
        CaptureChange::Captured => {
            set_cursor_grab(true);
            show_mouse(false);
            log::debug!("pointer captured");
        }
        CaptureChange::Released => {
            set_cursor_grab(false);
            show_mouse(true);
            log::debug!("pointer released");
        }
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameSimulationBreakdown + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            texture_source,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            window_resizable: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (texture_init_sender, texture_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let textures = match TextureBank::load(&texture_source)
                .context("failed to initialise textures")
            {
                Ok(textures) => textures,
                Err(error) => {
                    let _ = texture_init_sender.send(Err(error));
                    return;
                }
            };
            let _ = texture_init_sender.send(Ok(()));

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut pointer = PointerCapture::default();
            let mut draw_list = Vec::new();

            loop {
                let frame = pointer.observe(InputObservations::poll());
                if frame.quit {
                    break;
                }
                apply_capture_change(frame.capture);

                macroquad::window::clear_background(background);

                let viewport = Viewport::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt =
                    Duration::try_from_secs_f32(dt_seconds.max(0.0)).unwrap_or(Duration::MAX);
                let frame_input = FrameInput {
                    controls: frame.controls,
                    viewport,
                };

                let simulation_breakdown = update_scene(frame_dt, frame_input, &mut scene);

                let render_start = Instant::now();
                compose_frame(&scene, &textures, &mut draw_list);
                execute_draw_list(&draw_list, &textures);
                let render_duration = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation: simulation_breakdown.simulation,
                    scene_population: simulation_breakdown.scene_population,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(metrics) = fps_metrics {
                        log_fps(metrics);
                    }
                }

                macroquad::window::next_frame().await;
            }

            apply_capture_change(CaptureChange::Released);
        });

        texture_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

fn log_fps(metrics: FpsMetrics) {
    let FpsMetrics {
        per_second,
        trailing_ten_seconds,
        avg_simulation,
        avg_scene_population,
        avg_render,
    } = metrics;
    log::info!(
        "FPS: {:.2} (10s avg: {:.2}) | sim: {:>6.2}ms scene: {:>6.2}ms render: {:>6.2}ms",
        per_second,
        trailing_ten_seconds,
        avg_simulation.as_secs_f64() * 1_000.0,
        avg_scene_population.as_secs_f64() * 1_000.0,
        avg_render.as_secs_f64() * 1_000.0,
    );
}

/// Issues macroquad draw calls for every operation, in order.
///
/// Blits whose texture is unavailable are skipped; the composer only emits
/// them for loaded textures.
fn execute_draw_list(ops: &[DrawOp], textures: &TextureBank) {
    for op in ops {
        match op {
            DrawOp::FillRect { rect, color } => draw_rectangle(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                to_macroquad_color(*color),
            ),
            DrawOp::FillCircle {
                center,
                radius,
                color,
            } => draw_circle(center.x, center.y, *radius, to_macroquad_color(*color)),
            DrawOp::Line {
                from,
                to,
                thickness,
                color,
            } => draw_line(
                from.x,
                from.y,
                to.x,
                to.y,
                *thickness,
                to_macroquad_color(*color),
            ),
            DrawOp::Blit { role, source, dest } => {
                let Some(texture) = textures.texture(*role) else {
                    continue;
                };
                draw_texture_ex(
                    texture,
                    dest.x,
                    dest.y,
                    WHITE,
                    DrawTextureParams {
                        dest_size: Some(vec2(dest.width, dest.height)),
                        source: Some(MacroquadRect::new(
                            source.x,
                            source.y,
                            source.width,
                            source.height,
                        )),
                        ..DrawTextureParams::default()
                    },
                );
            }
            DrawOp::Text {
                text,
                position,
                size,
                color,
            } => {
                let _ = draw_text(text, position.x, position.y, *size, to_macroquad_color(*color));
            }
        }
    }
}

fn to_macroquad_color(color: gridshot_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
