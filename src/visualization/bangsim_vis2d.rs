use std::thread;
use std::time::{Duration, Instant};

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::simulation::scenario::Scenario;
use crate::visualization::input::ResizePrompt;
use crate::visualization::view::{RenderSink, ViewState};

/// Sleeps out whatever is left of the frame budget, like a fixed-rate clock tick
#[derive(Resource)]
struct FramePacer {
    budget: Duration,
    last: Instant,
}

pub fn run_2d(scenario: Scenario, view: ViewState) {
    let budget = Duration::from_secs_f64(1.0 / scenario.engine.frame_rate);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Big Bang".into(),
                resolution: (view.width() as f32, view.height() as f32).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(scenario)
        .insert_resource(view)
        .insert_resource(ResizePrompt::new())
        .insert_resource(FramePacer { budget, last: Instant::now() })
        .add_systems(Startup, setup_system)
        .add_systems(
            Update,
            (
                keyboard_input_system,
                apply_resize_system,
                window_resized_system,
                physics_step_system,
                draw_particles_system,
            )
                .chain(),
        )
        .add_systems(Last, frame_pacing_system)
        .run();
}

fn setup_system(mut commands: Commands, scenario: Res<Scenario>, view: Res<ViewState>) {
    // 2D camera, world origin in the middle of the window
    commands.spawn(Camera2dBundle::default());

    info!(
        "run_2d: {} particles on a {}x{} surface, {} steps/s ('+'/'-' zoom, 'R' resize, Esc quit)",
        scenario.system.len(),
        view.width(),
        view.height(),
        scenario.engine.frame_rate,
    );
}

fn keyboard_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut view: ResMut<ViewState>,
    mut prompt: ResMut<ResizePrompt>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.any_just_pressed([KeyCode::Equal, KeyCode::NumpadAdd]) {
        view.zoom_in();
        info!("zoom = {:.3}", view.zoom());
    }
    if keys.any_just_pressed([KeyCode::Minus, KeyCode::NumpadSubtract]) {
        view.zoom_out();
        info!("zoom = {:.3}", view.zoom());
    }

    if keys.just_pressed(KeyCode::KeyR) {
        if prompt.request() {
            info!("resize requested, enter the new size in the console");
        } else {
            warn!("a resize prompt is already waiting for console input");
        }
    }

    if keys.just_pressed(KeyCode::Escape) {
        exit.send(AppExit::Success);
    }
}

/// Apply a finished resize prompt at the frame boundary
fn apply_resize_system(
    mut prompt: ResMut<ResizePrompt>,
    mut view: ResMut<ViewState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Some(answer) = prompt.poll() else {
        return;
    };

    let applied = answer.and_then(|(width, height)| {
        view.set_resolution(width, height)?;
        Ok((width, height))
    });

    match applied {
        Ok((width, height)) => {
            if let Ok(mut window) = windows.get_single_mut() {
                window.resolution.set(width as f32, height as f32);
            }
            info!("resolution set to {width}x{height}");
        }
        Err(err) => warn!("resolution rejected: {err:#}"),
    }
}

/// Keep the projection in step with the real surface (e.g. dragged window edges)
fn window_resized_system(mut events: EventReader<WindowResized>, mut view: ResMut<ViewState>) {
    for ev in events.read() {
        let width = ev.width.round() as u32;
        let height = ev.height.round() as u32;
        if (width, height) == (view.width(), view.height()) {
            continue;
        }
        // Minimized windows report 0x0; keep the last usable size
        if view.set_resolution(width, height).is_ok() {
            debug!("surface resized to {width}x{height}");
        }
    }
}

fn physics_step_system(mut scenario: ResMut<Scenario>, mut steps: Local<u64>) {
    scenario.step();

    *steps += 1;
    if *steps % 600 == 0 {
        debug!("step {}: t = {:.4e} s", *steps, scenario.system.t);
    }
}

/// Draws onto Bevy gizmos, converting window pixels to 2D world coordinates
struct GizmoSink<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    half_width: f32,
    half_height: f32,
}

impl RenderSink for GizmoSink<'_, '_, '_> {
    fn draw_point(&mut self, x: i32, y: i32, color: [u8; 3], radius: u32) {
        // pixel y grows downward, world y grows upward
        let position = Vec2::new(x as f32 - self.half_width, self.half_height - y as f32);
        self.gizmos
            .circle_2d(position, radius as f32, Color::srgb_u8(color[0], color[1], color[2]));
    }
}

fn draw_particles_system(scenario: Res<Scenario>, view: Res<ViewState>, mut gizmos: Gizmos) {
    let mut sink = GizmoSink {
        gizmos: &mut gizmos,
        half_width: view.width() as f32 / 2.0,
        half_height: view.height() as f32 / 2.0,
    };
    scenario.render(&view, &mut sink);
}

fn frame_pacing_system(mut pacer: ResMut<FramePacer>) {
    let elapsed = pacer.last.elapsed();
    if elapsed < pacer.budget {
        thread::sleep(pacer.budget - elapsed);
    }
    pacer.last = Instant::now();
}
